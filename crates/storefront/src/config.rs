//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `VASTRA_DATABASE_URL` - `PostgreSQL` connection string
//! - `VASTRA_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//! - `PAYU_KEY` - PayU merchant key
//! - `PAYU_SALT` - PayU merchant salt
//!
//! ## Optional
//! - `VASTRA_HOST` - Bind address (default: 127.0.0.1)
//! - `VASTRA_PORT` - Listen port (default: 7000)
//! - `VASTRA_BASE_URL` - Public URL for this API (default: `http://localhost:7000`)
//! - `FRONTEND_URL` - Storefront SPA base URL (default: `http://localhost:5174`)
//! - `PAYU_SUCCESS_URL` - Browser redirect after successful payment
//!   (default: `{FRONTEND_URL}/payment-success`)
//! - `PAYU_FAIL_URL` - Browser redirect after failed payment
//!   (default: `{FRONTEND_URL}/payment-fail`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//!
//! # Fail-fast validation
//!
//! Gateway credentials are validated at startup: a key or salt containing a
//! pipe or whitespace would silently corrupt every computed digest, so a
//! malformed value is a startup error here, never a runtime correction.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
    #[error("Malformed gateway credential in {0}: {1}")]
    MalformedCredential(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for this API
    pub base_url: String,
    /// Origin of the SPA frontend, allowed by CORS and used to derive the
    /// default gateway redirect pages
    pub frontend_origin: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// PayU gateway configuration
    pub payu: PayuConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// PayU gateway configuration.
///
/// Implements `Debug` manually to redact the salt. The merchant key is not
/// a secret - it is included in every payment form the browser submits -
/// but the salt must never leave the server.
#[derive(Clone)]
pub struct PayuConfig {
    /// PayU merchant key (sent to the browser in gateway parameters)
    pub merchant_key: String,
    /// PayU merchant salt (server-side only, signs every digest)
    pub salt: SecretString,
    /// Frontend page the gateway redirects the buyer to on success
    pub success_url: String,
    /// Frontend page the gateway redirects the buyer to on failure
    pub fail_url: String,
}

impl std::fmt::Debug for PayuConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayuConfig")
            .field("merchant_key", &self.merchant_key)
            .field("salt", &"[REDACTED]")
            .field("success_url", &self.success_url)
            .field("fail_url", &self.fail_url)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check,
    /// gateway credential format).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("VASTRA_DATABASE_URL")?;
        let host = get_env_or_default("VASTRA_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("VASTRA_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("VASTRA_PORT", "7000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("VASTRA_PORT".to_string(), e.to_string()))?;
        let base_url = get_env_or_default("VASTRA_BASE_URL", "http://localhost:7000");
        let frontend_origin = get_env_or_default("FRONTEND_URL", "http://localhost:5174");
        validate_redirect_url(&frontend_origin, "FRONTEND_URL")?;
        let session_secret = get_required_secret("VASTRA_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "VASTRA_SESSION_SECRET")?;

        let payu = PayuConfig::from_env(&frontend_origin)?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            frontend_origin,
            session_secret,
            payu,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl PayuConfig {
    fn from_env(frontend_origin: &str) -> Result<Self, ConfigError> {
        let merchant_key = get_required_env("PAYU_KEY")?;
        validate_gateway_credential(&merchant_key, "PAYU_KEY")?;

        let salt = get_required_env("PAYU_SALT")?;
        validate_gateway_credential(&salt, "PAYU_SALT")?;

        let success_url = get_env_or_default(
            "PAYU_SUCCESS_URL",
            &format!("{frontend_origin}/payment-success"),
        );
        let fail_url =
            get_env_or_default("PAYU_FAIL_URL", &format!("{frontend_origin}/payment-fail"));
        validate_redirect_url(&success_url, "PAYU_SUCCESS_URL")?;
        validate_redirect_url(&fail_url, "PAYU_FAIL_URL")?;

        Ok(Self {
            merchant_key,
            salt: SecretString::from(salt),
            success_url,
            fail_url,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that a gateway credential is usable in the digest sequence.
///
/// The digest concatenates fields with `|`, so a credential containing a
/// pipe or whitespace can never verify against the gateway's computation.
/// The error message reports length only, never the value.
fn validate_gateway_credential(value: &str, var_name: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::MalformedCredential(
            var_name.to_string(),
            "must not be empty".to_string(),
        ));
    }
    if !value.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ConfigError::MalformedCredential(
            var_name.to_string(),
            format!(
                "must be ASCII alphanumeric ({} chars given); check for stray pipes, spaces, or copy-paste artifacts",
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Validate that a gateway redirect URL is an absolute http(s) URL.
fn validate_redirect_url(value: &str, var_name: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("must be http or https, got {}", url.scheme()),
        ));
    }
    Ok(())
}

/// Validate that a session secret meets minimum length requirements and is
/// not a placeholder.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    validate_secret_strength(value, var_name)
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_high() {
        // Random-looking string should have high entropy
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_session_secret_too_short() {
        let secret = SecretString::from("short");
        let result = validate_session_secret(&secret, "TEST_SESSION");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_gateway_credential_empty() {
        assert!(matches!(
            validate_gateway_credential("", "PAYU_SALT"),
            Err(ConfigError::MalformedCredential(_, _))
        ));
        assert!(matches!(
            validate_gateway_credential("   ", "PAYU_SALT"),
            Err(ConfigError::MalformedCredential(_, _))
        ));
    }

    #[test]
    fn test_validate_gateway_credential_rejects_pipes_and_spaces() {
        // A pipe inside the salt would corrupt the digest sequence
        assert!(validate_gateway_credential("abc|def", "PAYU_SALT").is_err());
        assert!(validate_gateway_credential("abc def", "PAYU_SALT").is_err());
        assert!(validate_gateway_credential("abc\n", "PAYU_SALT").is_err());
    }

    #[test]
    fn test_validate_gateway_credential_never_echoes_value() {
        let err = validate_gateway_credential("sup3r|salt", "PAYU_SALT").unwrap_err();
        assert!(!err.to_string().contains("sup3r"));
    }

    #[test]
    fn test_validate_gateway_credential_valid() {
        assert!(validate_gateway_credential("gtKFFx", "PAYU_KEY").is_ok());
        assert!(validate_gateway_credential("eCwWELxi", "PAYU_SALT").is_ok());
    }

    #[test]
    fn test_validate_redirect_url() {
        assert!(validate_redirect_url("https://shop.example.com/payment-success", "X").is_ok());
        assert!(validate_redirect_url("http://localhost:5174/payment-fail", "X").is_ok());
        assert!(validate_redirect_url("ftp://example.com/x", "X").is_err());
        assert!(validate_redirect_url("not a url", "X").is_err());
    }

    #[test]
    fn test_payu_config_debug_redacts_salt() {
        let config = PayuConfig {
            merchant_key: "gtKFFx".to_string(),
            salt: SecretString::from("eCwWELxiSuperSaltValue"),
            success_url: "http://localhost:5174/payment-success".to_string(),
            fail_url: "http://localhost:5174/payment-fail".to_string(),
        };

        let debug_output = format!("{config:?}");

        // Merchant key is public, salt is not
        assert!(debug_output.contains("gtKFFx"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("eCwWELxiSuperSaltValue"));
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 7000,
            base_url: "http://localhost:7000".to_string(),
            frontend_origin: "http://localhost:5174".to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            payu: PayuConfig {
                merchant_key: "gtKFFx".to_string(),
                salt: SecretString::from("eCwWELxi"),
                success_url: "http://localhost:5174/payment-success".to_string(),
                fail_url: "http://localhost:5174/payment-fail".to_string(),
            },
            sentry_dsn: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 7000);
    }
}
