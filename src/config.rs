use std::str::FromStr;

use crate::codec::{MAX_MEMORY_COST, MAX_TIME_COST, Params};
use crate::error::{Error, Result};

const DEFAULT_MEMORY_COST: u32 = 64 * 1024;
const DEFAULT_TIME_COST: u32 = 3;
const DEFAULT_KEY_LENGTH: u32 = 32;
const DEFAULT_SALT_LENGTH: u32 = 16;

// Argon2 lower bounds.
const MIN_KEY_LENGTH: u32 = 4;
const MIN_SALT_LENGTH: u32 = 8;
const MIN_MEMORY_PER_LANE: u32 = 8;

/// Engine configuration. Captured once by `Engine::new` and never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Working memory in KiB.
    pub memory_cost: u32,
    pub time_cost: u32,
    pub parallelism: u8,
    /// Digest length in bytes.
    pub key_length: u32,
    /// Salt length in bytes.
    pub salt_length: u32,
    /// Background rehash workers; also the rehash queue capacity.
    pub workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        let cpus = available_cpus();
        Config {
            memory_cost: DEFAULT_MEMORY_COST,
            time_cost: DEFAULT_TIME_COST,
            parallelism: u8::try_from(cpus).unwrap_or(u8::MAX),
            key_length: DEFAULT_KEY_LENGTH,
            salt_length: DEFAULT_SALT_LENGTH,
            workers: cpus,
        }
    }
}

impl Config {
    /// Load from `HASHKIT_*` environment variables. Unset variables keep their default.
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let config = Config {
            memory_cost: env_parse("HASHKIT_MEMORY_COST", defaults.memory_cost)?,
            time_cost: env_parse("HASHKIT_TIME_COST", defaults.time_cost)?,
            parallelism: env_parse("HASHKIT_PARALLELISM", defaults.parallelism)?,
            key_length: env_parse("HASHKIT_KEY_LENGTH", defaults.key_length)?,
            salt_length: env_parse("HASHKIT_SALT_LENGTH", defaults.salt_length)?,
            workers: env_parse("HASHKIT_WORKERS", defaults.workers)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.memory_cost == 0
            || self.time_cost == 0
            || self.parallelism == 0
            || self.key_length == 0
            || self.salt_length == 0
            || self.workers == 0
        {
            return Err(Error::Config("all cost and pool values must be positive".to_string()));
        }

        if self.memory_cost < MIN_MEMORY_PER_LANE * u32::from(self.parallelism) {
            return Err(Error::Config(format!(
                "memory_cost {} KiB is too small for {} lanes (need at least {})",
                self.memory_cost,
                self.parallelism,
                MIN_MEMORY_PER_LANE * u32::from(self.parallelism)
            )));
        }

        // Hashes above these would be refused by `decode`.
        if self.memory_cost > MAX_MEMORY_COST || self.time_cost > MAX_TIME_COST {
            return Err(Error::Config(format!(
                "work factors must not exceed m={MAX_MEMORY_COST} KiB, t={MAX_TIME_COST}"
            )));
        }

        if self.key_length < MIN_KEY_LENGTH {
            return Err(Error::Config(format!(
                "key_length must be at least {MIN_KEY_LENGTH} bytes"
            )));
        }

        if self.salt_length < MIN_SALT_LENGTH {
            return Err(Error::Config(format!(
                "salt_length must be at least {MIN_SALT_LENGTH} bytes"
            )));
        }

        Ok(())
    }

    /// The work factors written into every new hash.
    pub fn params(&self) -> Params {
        Params {
            memory_cost: self.memory_cost,
            time_cost: self.time_cost,
            parallelism: self.parallelism,
        }
    }
}

fn available_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_documented_values() {
        let config = Config::default();
        assert_eq!(config.memory_cost, 65536);
        assert_eq!(config.time_cost, 3);
        assert_eq!(config.key_length, 32);
        assert_eq!(config.salt_length, 16);
        assert!(config.parallelism >= 1);
        assert!(config.workers >= 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_values() {
        let base = Config::default();

        for config in [
            Config { memory_cost: 0, ..base.clone() },
            Config { time_cost: 0, ..base.clone() },
            Config { parallelism: 0, ..base.clone() },
            Config { key_length: 0, ..base.clone() },
            Config { salt_length: 0, ..base.clone() },
            Config { workers: 0, ..base.clone() },
        ] {
            assert!(matches!(config.validate(), Err(Error::Config(_))), "{config:?}");
        }
    }

    #[test]
    fn rejects_memory_too_small_for_lanes() {
        let config = Config {
            memory_cost: 16,
            parallelism: 4,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_work_factors_above_ceiling() {
        let base = Config::default();
        assert!(Config { memory_cost: MAX_MEMORY_COST + 1, ..base.clone() }.validate().is_err());
        assert!(Config { time_cost: MAX_TIME_COST + 1, ..base }.validate().is_err());
    }

    #[test]
    fn rejects_short_salt_and_key() {
        let base = Config::default();
        assert!(Config { salt_length: 4, ..base.clone() }.validate().is_err());
        assert!(Config { key_length: 2, ..base }.validate().is_err());
    }

    #[test]
    fn params_mirror_cost_fields() {
        let config = Config {
            memory_cost: 1024,
            time_cost: 2,
            parallelism: 2,
            ..Config::default()
        };
        assert_eq!(
            config.params(),
            Params {
                memory_cost: 1024,
                time_cost: 2,
                parallelism: 2
            }
        );
    }
}
