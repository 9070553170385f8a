use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::protocol::frame::MAX_FRAME_LEN;

/// Settings shared by every bot in a swarm.
///
/// Built once at startup and handed to sessions behind an `Arc`; nothing
/// mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub protocol_version: u32,
    pub host: String,
    pub port: u16,

    /// Horizontal blocks travelled per tick; gravity drift is a tenth of it
    pub speed: f64,
    /// Half-width of the square the bots roam in
    pub radius: f64,
    pub center_x: f64,
    pub center_z: f64,
    /// Simulate climbing, descending and falling
    pub y_axis: bool,
    pub vertical_continue_chance: f64,
    pub redirect_chance: f64,

    pub view_distance: i8,
    pub locale: String,
    pub resource_pack_response: u32,
    pub log_teleports: bool,

    pub tick_interval_ms: u64,
    pub settle_delay_ms: u64,
    pub play_delay_ms: u64,
    pub connect_timeout_ms: u64,
    pub max_frame_len: usize,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            protocol_version: 763,
            host: "127.0.0.1".into(),
            port: 25565,
            speed: 0.1,
            radius: 1000.0,
            center_x: 0.0,
            center_z: 0.0,
            y_axis: true,
            vertical_continue_chance: 0.98,
            redirect_chance: 0.1,
            view_distance: 2,
            locale: "en_GB".into(),
            resource_pack_response: 3,
            log_teleports: true,
            tick_interval_ms: 50,
            settle_delay_ms: 1000,
            play_delay_ms: 1000,
            connect_timeout_ms: 10_000,
            max_frame_len: MAX_FRAME_LEN,
        }
    }
}

impl BotConfig {
    /// Load from a JSON file; missing fields keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(Error::InvalidConfig("host must not be empty".into()));
        }
        if !self.speed.is_finite() || self.speed < 0.0 {
            return Err(Error::InvalidConfig(format!("speed must be finite and >= 0, got {}", self.speed)));
        }
        if !self.radius.is_finite() || self.radius < 0.0 {
            return Err(Error::InvalidConfig(format!("radius must be finite and >= 0, got {}", self.radius)));
        }
        if !self.center_x.is_finite() || !self.center_z.is_finite() {
            return Err(Error::InvalidConfig("center coordinates must be finite".into()));
        }
        for (name, p) in [
            ("vertical_continue_chance", self.vertical_continue_chance),
            ("redirect_chance", self.redirect_chance),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(Error::InvalidConfig(format!("{name} must be within [0, 1], got {p}")));
            }
        }
        if self.tick_interval_ms == 0 {
            return Err(Error::InvalidConfig("tick_interval_ms must be > 0".into()));
        }
        if self.max_frame_len == 0 || self.max_frame_len > MAX_FRAME_LEN {
            return Err(Error::InvalidConfig(format!("max_frame_len must be within 1..={MAX_FRAME_LEN}")));
        }
        Ok(())
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn play_delay(&self) -> Duration {
        Duration::from_millis(self.play_delay_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = BotConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.protocol_version, 763);
        assert_eq!(config.tick_interval(), Duration::from_millis(50));
        assert_eq!(config.server_addr(), "127.0.0.1:25565");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = BotConfig::from_json(r#"{ "host": "mc.local", "radius": 64, "y_axis": false }"#).unwrap();
        assert_eq!(config.host, "mc.local");
        assert_eq!(config.radius, 64.0);
        assert!(!config.y_axis);
        assert_eq!(config.speed, 0.1);
        assert_eq!(config.resource_pack_response, 3);
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad = [
            r#"{ "speed": -1 }"#,
            r#"{ "radius": -5 }"#,
            r#"{ "vertical_continue_chance": 1.5 }"#,
            r#"{ "tick_interval_ms": 0 }"#,
            r#"{ "host": "" }"#,
            r#"{ "max_frame_len": 0 }"#,
            r#"{ "speed": "fast" }"#,
        ];
        for text in bad {
            assert!(matches!(BotConfig::from_json(text), Err(Error::InvalidConfig(_))), "{text}");
        }
    }
}
