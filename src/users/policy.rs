use std::env;

/// Environment variable consulted on every policy decision, so operators
/// can retune the threshold without a restart.
pub const VIOLATION_LIMIT_ENV: &str = "TUTELA_VIOLATION_LIMIT";

/// Source of the violation threshold.
///
/// Read at decision time, never cached: the value may change between two
/// analysis events for the same account.
pub trait PolicyConfig: Send + Sync {
    fn violation_limit(&self) -> i64;
}

/// Threshold from the environment, falling back to the CLI-provided default.
#[derive(Debug, Clone, Copy)]
pub struct EnvPolicyConfig {
    default_limit: i64,
}

impl EnvPolicyConfig {
    #[must_use]
    pub const fn new(default_limit: i64) -> Self {
        Self { default_limit }
    }
}

impl PolicyConfig for EnvPolicyConfig {
    fn violation_limit(&self) -> i64 {
        env::var(VIOLATION_LIMIT_ENV)
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(self.default_limit)
    }
}
