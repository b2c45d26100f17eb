//! Configuration for the auth/tenancy core.
//!
//! Startup configuration is loaded once from environment variables, matching
//! the rest of the stack's convention. A handful of security parameters are
//! also runtime-tunable through a [`SettingsProvider`] collaborator (backed,
//! in production, by a settings store external to this crate) so an
//! operator can raise rate limits without a restart.

use std::sync::Arc;

/// Global configuration for the auth/tenancy core.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    /// Path to the sqlite database file (or `:memory:` for ephemeral stores).
    pub database_path: String,
    /// Log level.
    pub log_level: String,
    /// HMAC secret used to sign session tokens. Must be set in production;
    /// defaults to a fixed development value otherwise.
    pub session_secret: String,
    /// Session token lifetime, in seconds.
    pub session_ttl_seconds: i64,
    /// Default login rate limit, requests per IP per minute. Overridable at
    /// runtime via `security.ratelimit_login_per_minute`.
    pub ratelimit_login_per_minute: u32,
    /// Default failed-login threshold before account lockout. Overridable
    /// at runtime via `security.max_failed_attempts`.
    pub max_failed_attempts: i64,
    /// Default lockout duration in seconds. Overridable at runtime via
    /// `security.lockout_duration`.
    pub lockout_duration_seconds: i64,
    /// Whether anonymous (unauthenticated) S3 access is permitted for
    /// public buckets. Development convenience; should be false in production.
    pub allow_anonymous: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            database_path: "s3auth.db".to_owned(),
            log_level: "info".to_owned(),
            session_secret: "development-only-secret-change-me".to_owned(),
            session_ttl_seconds: 24 * 60 * 60,
            ratelimit_login_per_minute: 5,
            max_failed_attempts: 5,
            lockout_duration_seconds: 900,
            allow_anonymous: false,
        }
    }
}

impl AuthConfig {
    /// Load configuration from environment variables, falling back to
    /// [`AuthConfig::default`] for anything unset.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("S3AUTH_DATABASE_PATH") {
            config.database_path = v;
        }
        if let Ok(v) = std::env::var("S3AUTH_LOG_LEVEL") {
            config.log_level = v;
        }
        if let Ok(v) = std::env::var("S3AUTH_SESSION_SECRET") {
            config.session_secret = v;
        }
        if let Ok(v) = std::env::var("S3AUTH_SESSION_TTL_SECONDS") {
            if let Ok(parsed) = v.parse() {
                config.session_ttl_seconds = parsed;
            }
        }
        if let Ok(v) = std::env::var("S3AUTH_RATELIMIT_LOGIN_PER_MINUTE") {
            if let Ok(parsed) = v.parse() {
                config.ratelimit_login_per_minute = parsed;
            }
        }
        if let Ok(v) = std::env::var("S3AUTH_MAX_FAILED_ATTEMPTS") {
            if let Ok(parsed) = v.parse() {
                config.max_failed_attempts = parsed;
            }
        }
        if let Ok(v) = std::env::var("S3AUTH_LOCKOUT_DURATION_SECONDS") {
            if let Ok(parsed) = v.parse() {
                config.lockout_duration_seconds = parsed;
            }
        }
        if let Ok(v) = std::env::var("S3AUTH_ALLOW_ANONYMOUS") {
            config.allow_anonymous = v == "1" || v.eq_ignore_ascii_case("true");
        }

        config
    }
}

/// Runtime-tunable numeric settings, backed by a settings store external to
/// this crate. Keys follow a `component.name` convention; unset keys fall
/// back to the [`AuthConfig`] default passed at construction time.
pub trait SettingsProvider: Send + Sync + std::fmt::Debug {
    /// Fetch an integer setting by key, if one has been configured.
    fn get_int(&self, key: &str) -> Option<i64>;
}

/// A [`SettingsProvider`] that never overrides anything, used when no
/// settings store is wired up.
#[derive(Debug, Default)]
pub struct NoopSettingsProvider;

impl SettingsProvider for NoopSettingsProvider {
    fn get_int(&self, _key: &str) -> Option<i64> {
        None
    }
}

/// Resolve `security.ratelimit_login_per_minute`, falling back to `config`.
#[must_use]
pub fn ratelimit_login_per_minute(
    config: &AuthConfig,
    settings: &Arc<dyn SettingsProvider>,
) -> u32 {
    settings
        .get_int("security.ratelimit_login_per_minute")
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(config.ratelimit_login_per_minute)
}

/// Resolve `security.max_failed_attempts`, falling back to `config`.
#[must_use]
pub fn max_failed_attempts(config: &AuthConfig, settings: &Arc<dyn SettingsProvider>) -> i64 {
    settings
        .get_int("security.max_failed_attempts")
        .unwrap_or(config.max_failed_attempts)
}

/// Resolve `security.lockout_duration`, falling back to `config`.
#[must_use]
pub fn lockout_duration_seconds(config: &AuthConfig, settings: &Arc<dyn SettingsProvider>) -> i64 {
    settings
        .get_int("security.lockout_duration")
        .unwrap_or(config.lockout_duration_seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_create_default_config() {
        let config = AuthConfig::default();
        assert_eq!(config.database_path, "s3auth.db");
        assert_eq!(config.ratelimit_login_per_minute, 5);
        assert_eq!(config.max_failed_attempts, 5);
        assert_eq!(config.lockout_duration_seconds, 900);
        assert!(!config.allow_anonymous);
    }

    #[test]
    fn test_should_fall_back_to_default_when_setting_unset() {
        let config = AuthConfig::default();
        let settings: Arc<dyn SettingsProvider> = Arc::new(NoopSettingsProvider);
        assert_eq!(ratelimit_login_per_minute(&config, &settings), 5);
        assert_eq!(max_failed_attempts(&config, &settings), 5);
        assert_eq!(lockout_duration_seconds(&config, &settings), 900);
    }

    #[derive(Debug)]
    struct FixedSettingsProvider;

    impl SettingsProvider for FixedSettingsProvider {
        fn get_int(&self, key: &str) -> Option<i64> {
            match key {
                "security.max_failed_attempts" => Some(10),
                _ => None,
            }
        }
    }

    #[test]
    fn test_should_override_from_settings_provider() {
        let config = AuthConfig::default();
        let settings: Arc<dyn SettingsProvider> = Arc::new(FixedSettingsProvider);
        assert_eq!(max_failed_attempts(&config, &settings), 10);
        assert_eq!(ratelimit_login_per_minute(&config, &settings), 5);
    }
}
