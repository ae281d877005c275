use dotenv::var;
use hdlcd_gpio::lcd::hd44780::PinMap;
use serde::{Deserialize, Serialize};
use std::env::var_os;
use std::ffi::OsStr;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid pin number in {0}")]
    InvalidPin(&'static str),
    #[error("expected 4 data pins, got {0}")]
    DataPinCount(usize),
    #[error("unknown backend: {0}")]
    UnknownBackend(String),
    #[error("malformed config file: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Linux GPIO character device.
    #[default]
    Gpiod,
    /// `/dev/gpiomem` register map.
    Gpiomem,
    /// `/dev/mem` register map, needs root.
    Mem,
}

impl Backend {
    fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gpiod" => Ok(Backend::Gpiod),
            "gpiomem" => Ok(Backend::Gpiomem),
            "mem" => Ok(Backend::Mem),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq)]
pub struct Pins {
    pub rs: u32,
    pub rw: u32,
    pub e: u32,
    /// DB4 first.
    pub data: [u32; 4],
}

impl Default for Pins {
    fn default() -> Self {
        let map = PinMap::default();
        Pins {
            rs: map.rs,
            rw: map.rw,
            e: map.e,
            data: map.data,
        }
    }
}

impl From<Pins> for PinMap {
    fn from(pins: Pins) -> Self {
        PinMap {
            rs: pins.rs,
            rw: pins.rw,
            e: pins.e,
            data: pins.data,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
#[serde(default)]
pub struct Config {
    pub backend: Backend,
    pub chip: String,
    pub pins: Pins,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            backend: Backend::default(),
            chip: "/dev/gpiochip0".to_string(),
            pins: Pins::default(),
        }
    }
}

impl Config {
    /// Reads the config file if there is one, then applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::try_load()?.unwrap_or_default();
        config.apply_env(|key| var(key).ok())?;
        Ok(config)
    }

    fn try_load() -> Result<Option<Self>, ConfigError> {
        let config_str = var_os("HDLCD_CONFIG_FILE");
        let config_str: &OsStr = config_str.as_deref().unwrap_or(OsStr::new("hdlcd.json"));
        let config_path = Path::new(config_str);
        if config_path.exists() {
            let file = std::fs::File::open(config_path)?;
            let reader = std::io::BufReader::new(file);
            Ok(Some(serde_json::from_reader(reader)?))
        } else {
            Ok(None)
        }
    }

    fn apply_env(&mut self, get: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(backend) = get("HDLCD_BACKEND") {
            self.backend = Backend::parse(&backend)?;
        }
        if let Some(chip) = get("HDLCD_CHIP") {
            self.chip = chip;
        }
        for (key, pin) in [
            ("HDLCD_PIN_RS", &mut self.pins.rs),
            ("HDLCD_PIN_RW", &mut self.pins.rw),
            ("HDLCD_PIN_E", &mut self.pins.e),
        ] {
            if let Some(value) = get(key) {
                *pin = value.trim().parse().map_err(|_| ConfigError::InvalidPin(key))?;
            }
        }
        if let Some(value) = get("HDLCD_PINS_DATA") {
            self.pins.data = parse_pin_bus(&value)?;
        }
        Ok(())
    }
}

pub fn parse_pin_bus(pin_str: &str) -> Result<[u32; 4], ConfigError> {
    let pins = pin_str
        .split([',', ' ', ';'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| ConfigError::InvalidPin("HDLCD_PINS_DATA"))?;
    let count = pins.len();
    pins.try_into().map_err(|_| ConfigError::DataPinCount(count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn parses_pin_bus() {
        assert_eq!(parse_pin_bus("13,14,15,16").unwrap(), [13, 14, 15, 16]);
        assert_eq!(parse_pin_bus(" 26; 16 20,21 ").unwrap(), [26, 16, 20, 21]);
    }

    #[test]
    fn rejects_bad_pin_bus() {
        assert!(matches!(
            parse_pin_bus("1,2,3"),
            Err(ConfigError::DataPinCount(3))
        ));
        assert!(matches!(
            parse_pin_bus("1,2,x,4"),
            Err(ConfigError::InvalidPin(_))
        ));
    }

    #[test]
    fn defaults_match_board_wiring() {
        let map: PinMap = Config::default().pins.into();
        assert_eq!(map, PinMap::default());
        assert_eq!(map.e, 1);
        assert_eq!(map.data, [13, 14, 15, 16]);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: Config = serde_json::from_str(r#"{ "backend": "gpiomem" }"#).unwrap();
        assert_eq!(config.backend, Backend::Gpiomem);
        assert_eq!(config.chip, "/dev/gpiochip0");
        assert_eq!(config.pins, Pins::default());
    }

    #[test]
    fn full_json() {
        let config: Config = serde_json::from_str(
            r#"{
                "backend": "gpiod",
                "chip": "/dev/gpiochip4",
                "pins": { "rs": 22, "rw": 27, "e": 17, "data": [26, 16, 20, 21] }
            }"#,
        )
        .unwrap();
        assert_eq!(config.chip, "/dev/gpiochip4");
        assert_eq!(
            config.pins,
            Pins {
                rs: 22,
                rw: 27,
                e: 17,
                data: [26, 16, 20, 21]
            }
        );
    }

    #[test]
    fn env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("HDLCD_BACKEND", "Mem"),
            ("HDLCD_PIN_E", "17"),
            ("HDLCD_PINS_DATA", "26,16,20,21"),
        ]);
        let mut config = Config::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.backend, Backend::Mem);
        assert_eq!(config.pins.e, 17);
        assert_eq!(config.pins.rs, 0);
        assert_eq!(config.pins.data, [26, 16, 20, 21]);
    }

    #[test]
    fn env_rejects_garbage() {
        let mut config = Config::default();
        let err = config
            .apply_env(|key| (key == "HDLCD_PIN_RS").then(|| "x".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPin("HDLCD_PIN_RS")));

        let err = config
            .apply_env(|key| (key == "HDLCD_BACKEND").then(|| "spi".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownBackend(_)));
    }
}
