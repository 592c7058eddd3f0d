//! Configuration module.
//!
//! Configuration comes from two places:
//! - [`ServerConfig`]: process settings read from environment variables
//! - [`FormConfig`]: the form schema and SMTP settings, read once from a JSON document
//!
//! Both are loaded at startup and never change afterwards. A form document that
//! fails validation is fatal: the binary refuses to start.

use std::{
    env, fmt, fs,
    net::{IpAddr, Ipv4Addr},
    path::Path,
    str::FromStr,
    time::Duration,
};

use lettre::{message::Mailbox, Address};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::form::ExpectedFields;
use crate::mail::DeliveryMode;

const DEFAULT_SMTP_TIMEOUT_SECS: u64 = 10;

/// Command-line flag that turns off outbound mail for the whole process.
pub const DISABLE_MAIL_FLAG: &str = "--disable-mail";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("expectedFields must list at least one field")]
    NoExpectedFields,

    #[error("expectedFields contains an empty field name")]
    EmptyFieldName,

    #[error("expectedFields lists `{0}` more than once")]
    DuplicateField(String),

    #[error("SMTP host must not be empty")]
    MissingHost,

    #[error("SMTP port must not be zero")]
    InvalidPort,

    #[error("SMTPAuth is enabled but no username is configured")]
    MissingUsername,

    #[error("invalid {field} address `{value}`: {reason}")]
    InvalidAddress {
        field: &'static str,
        value: String,
        reason: String,
    },
}

// =============================================================================
// Server Configuration
// =============================================================================

/// Process settings loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the web server binds to
    pub bind_addr: IpAddr,

    /// Port for the web server to listen on
    pub port: u16,

    /// Path of the JSON form configuration document
    pub form_config_path: String,

    /// Upper bound for one SMTP send, connection included
    pub smtp_timeout: Duration,
}

impl ServerConfig {
    /// Load server settings from environment variables.
    pub fn from_env() -> Self {
        ServerConfig {
            bind_addr: parse_var("BIND_ADDR", IpAddr::V4(Ipv4Addr::UNSPECIFIED)),

            port: parse_var("PORT", 8080),

            form_config_path: env::var("FORM_CONFIG_PATH")
                .unwrap_or_else(|_| "config.json".to_string()),

            smtp_timeout: parse_timeout("SMTP_TIMEOUT_SECS", DEFAULT_SMTP_TIMEOUT_SECS),
        }
    }
}

/// Parse an environment variable, falling back to `default` when unset or invalid.
fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}

/// Parse a timeout in whole seconds; zero falls back to the default.
fn parse_timeout(name: &str, default_secs: u64) -> Duration {
    match parse_var(name, default_secs) {
        0 => {
            warn!(env_var = name, "Timeout must be positive, using default");
            Duration::from_secs(default_secs)
        }
        secs => Duration::from_secs(secs),
    }
}

/// Pick the delivery mode from the process arguments.
pub fn delivery_mode_from_args<I, S>(args: I) -> DeliveryMode
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    if args.into_iter().any(|arg| arg.as_ref() == DISABLE_MAIL_FLAG) {
        DeliveryMode::Disabled
    } else {
        DeliveryMode::Live
    }
}

// =============================================================================
// Form Configuration
// =============================================================================

/// Transport security for the outbound SMTP connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpSecurity {
    /// Plain connection upgraded with STARTTLS
    #[serde(alias = "starttls")]
    Tls,
    /// Implicit TLS from the first byte (SMTPS)
    #[serde(alias = "smtps")]
    Ssl,
    /// No encryption at all, for local relays only
    #[serde(alias = "")]
    None,
}

/// Form schema, SMTP connection and message envelope settings.
///
/// Key names follow the JSON document, e.g. `expectedFields`, `SMTPAuth`.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormConfig {
    pub expected_fields: ExpectedFields,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    #[serde(rename = "SMTPAuth")]
    pub smtp_auth: bool,
    #[serde(rename = "SMTPSecure")]
    pub smtp_secure: SmtpSecurity,
    pub from_email: String,
    pub from_name: String,
    pub to_email: String,
    pub subject: String,
}

impl FormConfig {
    /// Read and validate the form configuration document at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Parse and validate a form configuration document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: FormConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::MissingHost);
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.smtp_auth && self.username.trim().is_empty() {
            return Err(ConfigError::MissingUsername);
        }
        self.sender()?;
        self.recipient()?;
        Ok(())
    }

    /// The `From` mailbox, `fromName <fromEmail>`.
    pub fn sender(&self) -> Result<Mailbox, ConfigError> {
        let address = parse_address("fromEmail", &self.from_email)?;
        let name = Some(self.from_name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_owned);
        Ok(Mailbox::new(name, address))
    }

    /// The single `To` mailbox.
    pub fn recipient(&self) -> Result<Mailbox, ConfigError> {
        Ok(Mailbox::new(None, parse_address("toEmail", &self.to_email)?))
    }
}

fn parse_address(field: &'static str, value: &str) -> Result<Address, ConfigError> {
    value
        .trim()
        .parse::<Address>()
        .map_err(|err| ConfigError::InvalidAddress {
            field,
            value: value.to_string(),
            reason: err.to_string(),
        })
}

impl fmt::Debug for FormConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormConfig")
            .field("expected_fields", &self.expected_fields)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("smtp_auth", &self.smtp_auth)
            .field("smtp_secure", &self.smtp_secure)
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .field("to_email", &self.to_email)
            .field("subject", &self.subject)
            .finish()
    }
}

/// Build a valid form configuration for tests.
#[cfg(test)]
pub(crate) fn sample_form_config(fields: &[&str]) -> FormConfig {
    let fields = fields
        .iter()
        .map(|f| format!("\"{f}\""))
        .collect::<Vec<_>>()
        .join(", ");
    FormConfig::from_json_str(&format!(
        r#"{{
            "expectedFields": [{fields}],
            "host": "smtp.example.com",
            "port": 587,
            "username": "relay@example.com",
            "password": "hunter2",
            "SMTPAuth": true,
            "SMTPSecure": "tls",
            "fromEmail": "noreply@example.com",
            "fromName": "Website",
            "toEmail": "inbox@example.com",
            "subject": "New contact form submission"
        }}"#
    ))
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "expectedFields": ["name", "email", "message"],
        "host": "smtp.example.com",
        "port": 465,
        "username": "relay@example.com",
        "password": "secret",
        "SMTPAuth": true,
        "SMTPSecure": "ssl",
        "fromEmail": "noreply@example.com",
        "fromName": "Example Site",
        "toEmail": "owner@example.com",
        "subject": "Contact form"
    }"#;

    fn with(key: &str, value: serde_json::Value) -> String {
        let mut doc: serde_json::Value = serde_json::from_str(VALID).unwrap();
        doc[key] = value;
        doc.to_string()
    }

    #[test]
    fn test_parse_valid_document() {
        let config = FormConfig::from_json_str(VALID).unwrap();
        assert_eq!(config.expected_fields.len(), 3);
        assert_eq!(config.port, 465);
        assert!(config.smtp_auth);
        assert_eq!(config.smtp_secure, SmtpSecurity::Ssl);
        assert_eq!(config.sender().unwrap().email.to_string(), "noreply@example.com");
        assert_eq!(config.sender().unwrap().name.as_deref(), Some("Example Site"));
        assert_eq!(config.recipient().unwrap().email.to_string(), "owner@example.com");
    }

    #[test]
    fn test_security_aliases() {
        for (raw, expected) in [
            ("tls", SmtpSecurity::Tls),
            ("starttls", SmtpSecurity::Tls),
            ("ssl", SmtpSecurity::Ssl),
            ("smtps", SmtpSecurity::Ssl),
            ("none", SmtpSecurity::None),
            ("", SmtpSecurity::None),
        ] {
            let config = FormConfig::from_json_str(&with("SMTPSecure", raw.into())).unwrap();
            assert_eq!(config.smtp_secure, expected, "SMTPSecure = {raw:?}");
        }
    }

    #[test]
    fn test_missing_key_is_rejected() {
        let mut doc: serde_json::Value = serde_json::from_str(VALID).unwrap();
        doc.as_object_mut().unwrap().remove("toEmail");
        let err = FormConfig::from_json_str(&doc.to_string()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("toEmail"));
    }

    #[test]
    fn test_empty_expected_fields_rejected() {
        let err = FormConfig::from_json_str(&with("expectedFields", serde_json::json!([])))
            .unwrap_err();
        assert!(err.to_string().contains("at least one field"));
    }

    #[test]
    fn test_duplicate_expected_fields_rejected() {
        let err = FormConfig::from_json_str(&with(
            "expectedFields",
            serde_json::json!(["name", "email", "name"]),
        ))
        .unwrap_err();
        assert!(err.to_string().contains("`name` more than once"));
    }

    #[test]
    fn test_invalid_addresses_rejected() {
        let err = FormConfig::from_json_str(&with("toEmail", "not-an-address".into())).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidAddress { field: "toEmail", .. }
        ));

        let err = FormConfig::from_json_str(&with("fromEmail", "".into())).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidAddress {
                field: "fromEmail",
                ..
            }
        ));
    }

    #[test]
    fn test_smtp_settings_checked() {
        assert!(matches!(
            FormConfig::from_json_str(&with("host", " ".into())).unwrap_err(),
            ConfigError::MissingHost
        ));
        assert!(matches!(
            FormConfig::from_json_str(&with("port", 0.into())).unwrap_err(),
            ConfigError::InvalidPort
        ));
        assert!(matches!(
            FormConfig::from_json_str(&with("username", "".into())).unwrap_err(),
            ConfigError::MissingUsername
        ));

        // Without authentication the username may stay empty
        let mut doc: serde_json::Value = serde_json::from_str(VALID).unwrap();
        doc["SMTPAuth"] = false.into();
        doc["username"] = "".into();
        assert!(FormConfig::from_json_str(&doc.to_string()).is_ok());
    }

    #[test]
    fn test_empty_from_name_gives_bare_mailbox() {
        let config = FormConfig::from_json_str(&with("fromName", "  ".into())).unwrap();
        assert_eq!(config.sender().unwrap().name, None);
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = FormConfig::from_json_str(VALID).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = FormConfig::from_path("/nonexistent/form-relay/config.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_parse_var_valid_and_invalid() {
        env::set_var("FORM_RELAY_TEST_PORT", "9090");
        assert_eq!(parse_var("FORM_RELAY_TEST_PORT", 8080u16), 9090);
        env::set_var("FORM_RELAY_TEST_PORT", "not-a-port");
        assert_eq!(parse_var("FORM_RELAY_TEST_PORT", 8080u16), 8080);
        env::remove_var("FORM_RELAY_TEST_PORT");
    }

    #[test]
    fn test_parse_timeout_rejects_zero() {
        env::set_var("FORM_RELAY_TEST_TIMEOUT", "0");
        assert_eq!(
            parse_timeout("FORM_RELAY_TEST_TIMEOUT", 10),
            Duration::from_secs(10)
        );
        env::set_var("FORM_RELAY_TEST_TIMEOUT", "3");
        assert_eq!(
            parse_timeout("FORM_RELAY_TEST_TIMEOUT", 10),
            Duration::from_secs(3)
        );
        env::remove_var("FORM_RELAY_TEST_TIMEOUT");
        assert_eq!(
            parse_timeout("FORM_RELAY_TEST_TIMEOUT", 10),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_parse_var_default() {
        assert_eq!(parse_var("FORM_RELAY_NONEXISTENT_VAR", 10u64), 10);
    }

    #[test]
    fn test_delivery_mode_from_args() {
        assert_eq!(
            delivery_mode_from_args(["form-relay"]),
            DeliveryMode::Live
        );
        assert_eq!(
            delivery_mode_from_args(["form-relay", "--disable-mail"]),
            DeliveryMode::Disabled
        );
    }
}
