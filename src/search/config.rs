/*
 * This source code is licensed under the Business Source License 1.1.
 */

//! Search configuration knobs.

use core::str::FromStr;
use core::time::Duration;

use hashbrown::HashMap;

use crate::error::ConfigError;

/// How localopt pairs candidate partitions with image expansions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ExpansionMode {
    /// Score every expansion for every candidate partition.
    #[default]
    All,
    /// Each restart sticks to one expansion (restart index modulo the
    /// expansion count).
    PerRestart,
}

impl FromStr for ExpansionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "per_restart" | "perrestart" | "single" => Ok(Self::PerRestart),
            _ => Err(ConfigError::InvalidValue { key: "expansions".into(), value: s.into() }),
        }
    }
}

/// Configuration for one search run.
///
/// Every field has a default, so callers only set the knobs they care about.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SearchConfig {
    /// Smallest allowed cluster.  Default: 1.
    pub min_cluster_size: usize,

    /// Number of localopt restarts.  Default: 50.
    pub restarts: usize,

    /// Maximum improvement sweeps per localopt run.  Default: 1000.
    pub max_iterations: usize,

    /// Wall-clock budget for the whole run.  Default: none.
    pub max_time: Option<Duration>,

    /// Seed for random starts.  Default: none (drawn from entropy and logged).
    pub seed: Option<u64>,

    /// Expansion pairing for localopt.  Default: [`ExpansionMode::All`].
    pub expansion_mode: ExpansionMode,

    /// Run localopt restarts on worker threads (`parallel` feature).
    /// Default: false.
    pub parallel: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_cluster_size: 1,
            restarts: 50,
            max_iterations: 1000,
            max_time: None,
            seed: None,
            expansion_mode: ExpansionMode::All,
            parallel: false,
        }
    }
}

fn parse_knob<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

impl SearchConfig {
    /// Build a configuration from the external string map.
    ///
    /// Keys are case-insensitive: `minclustersize`, `nbrrestarts`,
    /// `maxiterations`, `maxtime` (seconds, fractional allowed), `seed`,
    /// `expansions` (`all` | `per_restart`), `parallel` (`true` | `false`).
    /// Missing keys keep their defaults.
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        for (key, value) in map {
            match key.to_ascii_lowercase().as_str() {
                "minclustersize" => config.min_cluster_size = parse_knob(key, value)?,
                "nbrrestarts" => config.restarts = parse_knob(key, value)?,
                "maxiterations" => config.max_iterations = parse_knob(key, value)?,
                "maxtime" => {
                    let secs: f64 = parse_knob(key, value)?;
                    let max_time = Duration::try_from_secs_f64(secs)
                        .map_err(|_| ConfigError::InvalidValue { key: key.clone(), value: value.clone() })?;
                    config.max_time = Some(max_time);
                }
                "seed" => config.seed = Some(parse_knob(key, value)?),
                "expansions" => config.expansion_mode = value.parse()?,
                "parallel" => config.parallel = parse_knob(key, value)?,
                _ => return Err(ConfigError::UnknownKey { key: key.clone() }),
            }
        }
        Ok(config)
    }

    /// Check knob ranges that do not depend on the network.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_cluster_size == 0 {
            return Err(ConfigError::InvalidValue { key: "minclustersize".into(), value: "0".into() });
        }
        if self.restarts == 0 {
            return Err(ConfigError::InvalidValue { key: "nbrrestarts".into(), value: "0".into() });
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::InvalidValue { key: "maxiterations".into(), value: "0".into() });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_from_empty_map() {
        assert_eq!(SearchConfig::from_map(&HashMap::new()).unwrap(), SearchConfig::default());
    }

    #[test]
    fn knobs_parsed() {
        let c = SearchConfig::from_map(&map(&[
            ("minclustersize", "2"),
            ("nbrrestarts", "7"),
            ("MaxIterations", "30"),
            ("maxtime", "1.5"),
            ("seed", "42"),
            ("expansions", "per_restart"),
            ("parallel", "true"),
        ]))
        .unwrap();
        assert_eq!(c.min_cluster_size, 2);
        assert_eq!(c.restarts, 7);
        assert_eq!(c.max_iterations, 30);
        assert_eq!(c.max_time, Some(Duration::from_millis(1500)));
        assert_eq!(c.seed, Some(42));
        assert_eq!(c.expansion_mode, ExpansionMode::PerRestart);
        assert!(c.parallel);
    }

    #[test]
    fn bad_knobs_rejected() {
        assert!(matches!(
            SearchConfig::from_map(&map(&[("colour", "red")])),
            Err(ConfigError::UnknownKey { .. })
        ));
        assert!(matches!(
            SearchConfig::from_map(&map(&[("seed", "-1")])),
            Err(ConfigError::InvalidValue { .. })
        ));
        for secs in ["-2", "1e30", "inf", "NaN"] {
            assert!(
                matches!(
                    SearchConfig::from_map(&map(&[("maxtime", secs)])),
                    Err(ConfigError::InvalidValue { .. })
                ),
                "maxtime={} must be rejected",
                secs
            );
        }
    }

    #[test]
    fn zero_knobs_invalid() {
        let c = SearchConfig { restarts: 0, ..SearchConfig::default() };
        assert!(c.validate().is_err());
        assert!(SearchConfig::default().validate().is_ok());
    }
}
