use chrono::Duration;

use crate::error::ConfigError;

/// Phase lengths for one pomodoro run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    work: Duration,
    short_break: Duration,
    long_break: Duration,
    cycles_before_long_break: u32,
}

impl SessionConfig {
    /// Build a config, rejecting zero-length phases and a zero cycle count.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] naming the offending field.
    pub fn new(
        work: Duration,
        short_break: Duration,
        long_break: Duration,
        cycles_before_long_break: u32,
    ) -> Result<Self, ConfigError> {
        for (key, len) in [
            ("work", work),
            ("short_break", short_break),
            ("long_break", long_break),
        ] {
            if len <= Duration::zero() {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "phase length must be positive".to_string(),
                });
            }
        }
        if cycles_before_long_break == 0 {
            return Err(ConfigError::InvalidValue {
                key: "cycles_before_long_break".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(Self {
            work,
            short_break,
            long_break,
            cycles_before_long_break,
        })
    }

    pub fn from_minutes(
        work: u32,
        short_break: u32,
        long_break: u32,
        cycles_before_long_break: u32,
    ) -> Result<Self, ConfigError> {
        Self::new(
            Duration::minutes(i64::from(work)),
            Duration::minutes(i64::from(short_break)),
            Duration::minutes(i64::from(long_break)),
            cycles_before_long_break,
        )
    }

    pub fn work(&self) -> Duration {
        self.work
    }

    pub fn short_break(&self) -> Duration {
        self.short_break
    }

    pub fn long_break(&self) -> Duration {
        self.long_break
    }

    pub fn cycles_before_long_break(&self) -> u32 {
        self.cycles_before_long_break
    }
}

impl Default for SessionConfig {
    /// 25 / 5 / 15 minutes, long break every fourth cycle.
    fn default() -> Self {
        Self {
            work: Duration::minutes(25),
            short_break: Duration::minutes(5),
            long_break: Duration::minutes(15),
            cycles_before_long_break: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_cycles() {
        let err = SessionConfig::from_minutes(25, 5, 15, 0).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "cycles_before_long_break"));
    }

    #[test]
    fn rejects_zero_length_phase() {
        assert!(SessionConfig::from_minutes(25, 0, 15, 4).is_err());
    }

    #[test]
    fn default_matches_classic_pomodoro() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg, SessionConfig::from_minutes(25, 5, 15, 4).unwrap());
    }
}
