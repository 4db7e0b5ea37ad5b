//! Serializes run seeds as decimal strings so 64-bit values survive JSON
//! consumers that only have doubles. Numbers are still accepted on input.

use serde::de::Error;
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S>(seed: &u64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&seed.to_string())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SeedInput {
        Text(String),
        Number(u64),
    }

    match SeedInput::deserialize(deserializer)? {
        SeedInput::Text(raw) => raw.trim().parse::<u64>().map_err(D::Error::custom),
        SeedInput::Number(seed) => Ok(seed),
    }
}

#[cfg(test)]
mod tests {
    use crate::{SimulationConfig, SCHEMA_VERSION_V1};

    #[test]
    fn seed_above_f64_precision_survives_round_trip() {
        let config = SimulationConfig {
            seed: u64::MAX - 7,
            ..SimulationConfig::default()
        };
        let encoded = serde_json::to_string(&config).expect("serialize");
        assert!(encoded.contains(&format!("\"{}\"", u64::MAX - 7)));
        let decoded: SimulationConfig = serde_json::from_str(&encoded).expect("deserialize");
        assert_eq!(decoded.seed, u64::MAX - 7);
    }

    #[test]
    fn numeric_seed_is_accepted() {
        let decoded: SimulationConfig =
            serde_json::from_str(r#"{"run_id":"r","seed":42,"max_ticks":10}"#).expect("numeric");
        assert_eq!(decoded.seed, 42);
    }

    #[test]
    fn garbage_seed_is_rejected() {
        let parsed = serde_json::from_str::<SimulationConfig>(
            r#"{"run_id":"r","seed":"forty-two","max_ticks":10}"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn absent_schema_version_defaults_and_run_fields_are_kept() {
        let decoded: SimulationConfig =
            serde_json::from_str(r#"{"run_id":"run:siege","seed":"9","max_ticks":48}"#)
                .expect("config");
        assert_eq!(
            decoded,
            SimulationConfig {
                schema_version: SCHEMA_VERSION_V1.to_string(),
                run_id: "run:siege".to_string(),
                seed: 9,
                max_ticks: 48,
            }
        );

        let encoded = serde_json::to_value(&decoded).expect("serialize");
        assert_eq!(encoded["schema_version"], SCHEMA_VERSION_V1);
        assert_eq!(encoded["seed"], "9");
    }

    #[test]
    fn missing_seed_is_rejected() {
        let parsed = serde_json::from_str::<SimulationConfig>(r#"{"run_id":"r","max_ticks":10}"#);
        assert!(parsed.is_err());
    }
}
