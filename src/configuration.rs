use crate::error::ConfigError;

const DEFAULT_ACCESS_TOKEN_EXPIRY: i64 = 15 * 60;
const DEFAULT_REFRESH_TOKEN_EXPIRY: i64 = 7 * 24 * 60 * 60;
// Ten years. Keeps `issued_at + ttl` well inside chrono's range.
const MAX_TOKEN_EXPIRY: i64 = 10 * 365 * 24 * 60 * 60;

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub jwt: JwtSettings,
    #[serde(default)]
    pub password: PasswordSettings,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Token signing settings
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry: i64, // seconds (900 = 15 minutes)
    #[serde(default = "default_refresh_token_expiry")]
    pub refresh_token_expiry: i64, // seconds (604800 = 7 days)
}

// Keep the secret out of Debug output.
impl std::fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret", &"[redacted]")
            .field("access_token_expiry", &self.access_token_expiry)
            .field("refresh_token_expiry", &self.refresh_token_expiry)
            .finish()
    }
}

impl JwtSettings {
    pub fn access_ttl(&self) -> Result<chrono::Duration, ConfigError> {
        ttl("jwt.access_token_expiry", self.access_token_expiry)
    }

    pub fn refresh_ttl(&self) -> Result<chrono::Duration, ConfigError> {
        ttl("jwt.refresh_token_expiry", self.refresh_token_expiry)
    }
}

fn ttl(key: &str, seconds: i64) -> Result<chrono::Duration, ConfigError> {
    chrono::TimeDelta::try_seconds(seconds)
        .ok_or_else(|| ConfigError::InvalidValue(format!("{} {} is out of range", key, seconds)))
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct PasswordSettings {
    #[serde(default = "default_hash_cost")]
    pub hash_cost: u32,
}

impl Default for PasswordSettings {
    fn default() -> Self {
        Self {
            hash_cost: default_hash_cost(),
        }
    }
}

fn default_access_token_expiry() -> i64 {
    DEFAULT_ACCESS_TOKEN_EXPIRY
}

fn default_refresh_token_expiry() -> i64 {
    DEFAULT_REFRESH_TOKEN_EXPIRY
}

fn default_hash_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    /// Reject settings the auth subsystem cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt.secret".to_string()));
        }
        if self.jwt.access_token_expiry <= 0 {
            return Err(ConfigError::InvalidValue(
                "jwt.access_token_expiry must be positive".to_string(),
            ));
        }
        if self.jwt.refresh_token_expiry > MAX_TOKEN_EXPIRY {
            return Err(ConfigError::InvalidValue(format!(
                "jwt.refresh_token_expiry must not exceed {} seconds",
                MAX_TOKEN_EXPIRY
            )));
        }
        if self.jwt.refresh_token_expiry < self.jwt.access_token_expiry {
            return Err(ConfigError::InvalidValue(
                "jwt.refresh_token_expiry must not be shorter than jwt.access_token_expiry"
                    .to_string(),
            ));
        }
        if !(4..=31).contains(&self.password.hash_cost) {
            return Err(ConfigError::InvalidValue(format!(
                "password.hash_cost {} is outside 4..=31",
                self.password.hash_cost
            )));
        }
        Ok(())
    }
}

/// Load settings from `configuration.*` (optional) and `APP_*` environment variables
///
/// Environment variables win, e.g. `APP_JWT__SECRET` or `APP_JWT__ACCESS_TOKEN_EXPIRY`.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;
    let settings = settings.try_deserialize::<Settings>()?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_settings() -> Settings {
        Settings {
            jwt: JwtSettings {
                secret: "test-secret-key-at-least-32-characters-long".to_string(),
                access_token_expiry: DEFAULT_ACCESS_TOKEN_EXPIRY,
                refresh_token_expiry: DEFAULT_REFRESH_TOKEN_EXPIRY,
            },
            password: PasswordSettings::default(),
            log_level: default_log_level(),
        }
    }

    #[test]
    fn test_valid_settings_pass() {
        assert!(valid_settings().validate().is_ok());
    }

    #[test]
    fn test_empty_secret_rejected() {
        let mut settings = valid_settings();
        settings.jwt.secret = "   ".to_string();
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::MissingRequired(_))
        ));
    }

    #[test]
    fn test_non_positive_ttl_rejected() {
        let mut settings = valid_settings();
        settings.jwt.access_token_expiry = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_refresh_shorter_than_access_rejected() {
        let mut settings = valid_settings();
        settings.jwt.refresh_token_expiry = 60;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_huge_ttl_rejected() {
        let mut settings = valid_settings();
        settings.jwt.refresh_token_expiry = 10_000_000_000_000;
        assert!(matches!(settings.validate(), Err(ConfigError::InvalidValue(_))));

        settings.jwt.refresh_token_expiry = MAX_TOKEN_EXPIRY;
        settings.jwt.access_token_expiry = MAX_TOKEN_EXPIRY + 1;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_ttl_conversion_never_panics() {
        let mut settings = valid_settings();
        settings.jwt.access_token_expiry = i64::MAX;
        settings.jwt.refresh_token_expiry = i64::MAX;

        assert!(matches!(settings.jwt.access_ttl(), Err(ConfigError::InvalidValue(_))));
        assert!(matches!(settings.jwt.refresh_ttl(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_longest_valid_ttl_issues_tokens() {
        let mut settings = valid_settings();
        settings.jwt.refresh_token_expiry = MAX_TOKEN_EXPIRY;
        settings.validate().expect("Upper bound itself is allowed");

        let issuer = crate::auth::TokenIssuer::from_settings(&settings.jwt).unwrap();
        assert!(issuer.issue_pair(uuid::Uuid::new_v4(), chrono::Utc::now()).is_ok());
    }

    #[test]
    fn test_hash_cost_out_of_range() {
        let mut settings = valid_settings();
        settings.password.hash_cost = 3;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_defaults_from_partial_source() {
        let settings = config::Config::builder()
            .set_override("jwt.secret", "from-override")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize::<Settings>()
            .unwrap();

        assert_eq!(settings.jwt.access_token_expiry, 900);
        assert_eq!(settings.jwt.refresh_token_expiry, 604800);
        assert_eq!(settings.password.hash_cost, bcrypt::DEFAULT_COST);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", valid_settings().jwt);
        assert!(!rendered.contains("test-secret"));
    }
}
