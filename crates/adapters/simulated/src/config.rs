//! Simulated transport configuration.

use serde::Deserialize;

/// Configuration for the simulated medium.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulatedConfig {
    /// Delay applied to every operation, in milliseconds.
    pub latency_ms: u64,
    /// Fixtures answering on the medium.
    pub lights: Vec<SimulatedLightConfig>,
}

/// One simulated fixture.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulatedLightConfig {
    /// Hardware address, e.g. `"d0:73:d5:01:02:03"`.
    pub mac: String,
    pub label: String,
    /// Label of the group the fixture belongs to.
    pub group: String,
    /// Number of zones for multi-zone fixtures; absent for single bulbs.
    #[serde(default)]
    pub zones: Option<u16>,
}

impl SimulatedLightConfig {
    fn new(mac: &str, label: &str, group: &str, zones: Option<u16>) -> Self {
        Self {
            mac: mac.to_string(),
            label: label.to_string(),
            group: group.to_string(),
            zones,
        }
    }
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            latency_ms: 20,
            lights: vec![
                SimulatedLightConfig::new("d0:73:d5:00:00:01", "Desk Lamp", "Office", None),
                SimulatedLightConfig::new("d0:73:d5:00:00:02", "Ceiling", "Office", None),
                SimulatedLightConfig::new("d0:73:d5:00:00:03", "Shelf Strip", "Living Room", Some(16)),
                SimulatedLightConfig::new("d0:73:d5:00:00:04", "Reading Light", "Living Room", None),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_provide_demo_fixtures_by_default() {
        let config = SimulatedConfig::default();
        assert_eq!(config.lights.len(), 4);
        assert!(config.lights.iter().any(|l| l.zones.is_some()));
    }

    #[test]
    fn should_parse_lights_from_toml() {
        let config: SimulatedConfig = toml::from_str(
            r#"
            latency_ms = 0

            [[lights]]
            mac = "d0:73:d5:aa:bb:cc"
            label = "Porch"
            group = "Outside"

            [[lights]]
            mac = "d0:73:d5:aa:bb:cd"
            label = "Eaves"
            group = "Outside"
            zones = 8
            "#,
        )
        .unwrap();

        assert_eq!(config.latency_ms, 0);
        assert_eq!(config.lights.len(), 2);
        assert_eq!(config.lights[0].zones, None);
        assert_eq!(config.lights[1].zones, Some(8));
    }

    #[test]
    fn should_fill_missing_fields_with_defaults() {
        let config: SimulatedConfig = toml::from_str("latency_ms = 5").unwrap();
        assert_eq!(config.latency_ms, 5);
        assert_eq!(config.lights.len(), 4);
    }
}
