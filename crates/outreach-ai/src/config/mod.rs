use std::env;
use std::fmt;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::workflows::outreach::rules::{default_rules, Rule};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the decisioning service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub decision: DecisionConfig,
    pub generation: GenerationConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = match env::var("APP_LOG_FORMAT") {
            Ok(raw) => LogFormat::parse(&raw).ok_or(ConfigError::InvalidLogFormat(raw))?,
            Err(_) => LogFormat::Compact,
        };

        let rules_path = non_empty_var("APP_DECISION_RULES").map(PathBuf::from);
        let api_key = non_empty_var("APP_TEXT_GENERATION_KEY");

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                log_format,
            },
            decision: DecisionConfig { rules_path },
            generation: GenerationConfig { api_key },
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Output shape of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" | "text" => Some(Self::Compact),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
}

/// Where the rule engine takes its rule set from.
#[derive(Debug, Clone, Default)]
pub struct DecisionConfig {
    pub rules_path: Option<PathBuf>,
}

impl DecisionConfig {
    /// Loads the configured rule file, or the built-in defaults when none is set.
    pub fn rule_set(&self) -> Result<Vec<Rule>, ConfigError> {
        let Some(path) = &self.rules_path else {
            return Ok(default_rules());
        };

        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Rules {
            path: path.clone(),
            reason: source.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Rules {
            path: path.clone(),
            reason: source.to_string(),
        })
    }
}

/// Credentials for the text-generation collaborator used for narration.
#[derive(Debug, Clone, Default)]
pub struct GenerationConfig {
    pub api_key: Option<String>,
}

impl GenerationConfig {
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidLogFormat(String),
    Rules { path: PathBuf, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidLogFormat(value) => {
                write!(f, "APP_LOG_FORMAT must be 'compact' or 'json', got '{value}'")
            }
            ConfigError::Rules { path, reason } => {
                write!(f, "unable to load rules from {}: {}", path.display(), reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidLogFormat(_)
            | ConfigError::Rules { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::outreach::domain::OutreachAction;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("APP_LOG_FORMAT");
        env::remove_var("APP_DECISION_RULES");
        env::remove_var("APP_TEXT_GENERATION_KEY");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.telemetry.log_format, LogFormat::Compact);
        assert!(config.decision.rules_path.is_none());
        assert!(!config.generation.is_configured());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn rejects_unknown_log_format() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_LOG_FORMAT", "xml");
        let err = AppConfig::load().expect_err("xml is not a log format");
        assert!(matches!(err, ConfigError::InvalidLogFormat(value) if value == "xml"));
        reset_env();
    }

    #[test]
    fn rule_set_defaults_without_path() {
        let rules = DecisionConfig::default().rule_set().expect("defaults load");
        assert_eq!(rules.len(), 4);
    }

    #[test]
    fn rule_set_reads_json_file() {
        let path = env::temp_dir().join(format!("outreach-rules-{}.json", std::process::id()));
        let body = r#"[
            {
                "id": "call_everyone",
                "condition": {"predicate": {"kind": "has_phone"}},
                "action": "make_voice_call",
                "priority": 0,
                "enabled": true
            }
        ]"#;
        fs::write(&path, body).expect("write rule file");

        let config = DecisionConfig {
            rules_path: Some(path.clone()),
        };
        let rules = config.rule_set().expect("rule file parses");
        fs::remove_file(&path).ok();

        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].id, "call_everyone");
        assert_eq!(rules[0].action, OutreachAction::MakeVoiceCall);
    }

    #[test]
    fn rule_set_reports_missing_file() {
        let config = DecisionConfig {
            rules_path: Some(PathBuf::from("/nonexistent/outreach-rules.json")),
        };
        let err = config.rule_set().expect_err("missing file fails");
        assert!(matches!(err, ConfigError::Rules { .. }));
    }
}
