use std::time::Duration;

use kiosk_printer::DEFAULT_TTL;

/// Default loopback port
pub const DEFAULT_HTTP_PORT: u16 = 9110;

/// Kiosk origins allowed by default
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";

/// Pause between sequential jobs of a batch or a multi-copy print
pub const DEFAULT_BATCH_ITEM_DELAY: Duration = Duration::from_millis(250);

/// Bridge configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | HTTP_PORT | 9110 | Loopback port |
/// | ALLOWED_ORIGINS | http://localhost:3000,http://127.0.0.1:3000 | CORS allow-list, comma separated |
/// | DISCOVERY_TTL_SECS | 300 | Printer snapshot TTL |
/// | BATCH_ITEM_DELAY_MS | 250 | Delay between sequential jobs |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | Graceful shutdown budget |
/// | LOG_LEVEL | info | Log level |
/// | LOG_DIR | (unset) | Directory for daily rolling log files |
/// | ENVIRONMENT | development | Runtime environment |
///
/// # Example
///
/// ```ignore
/// HTTP_PORT=9200 BATCH_ITEM_DELAY_MS=100 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Port bound on 127.0.0.1
    pub http_port: u16,
    /// Origins the kiosk may call from
    pub allowed_origins: Vec<String>,
    /// How long a printer snapshot stays fresh
    pub discovery_ttl: Duration,
    /// Delay between sequential jobs
    pub batch_item_delay: Duration,
    /// Graceful shutdown budget (milliseconds)
    pub shutdown_timeout_ms: u64,
    /// Log level: trace | debug | info | warn | error
    pub log_level: String,
    /// Log file directory, console only when unset
    pub log_dir: Option<String>,
    /// Runtime environment: development | staging | production
    pub environment: String,
}

impl Config {
    /// Load from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            http_port: lookup("HTTP_PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(DEFAULT_HTTP_PORT),
            allowed_origins: parse_origins(
                &lookup("ALLOWED_ORIGINS").unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.into()),
            ),
            discovery_ttl: parsed("DISCOVERY_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TTL),
            batch_item_delay: parsed("BATCH_ITEM_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_BATCH_ITEM_DELAY),
            shutdown_timeout_ms: parsed("SHUTDOWN_TIMEOUT_MS").unwrap_or(10000),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".into()),
            log_dir: lookup("LOG_DIR").filter(|d| !d.trim().is_empty()),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".into()),
        }
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Whether running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Whether running in development
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().trim_end_matches('/'))
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.http_port, 9110);
        assert_eq!(
            config.allowed_origins,
            vec!["http://localhost:3000", "http://127.0.0.1:3000"]
        );
        assert_eq!(config.discovery_ttl, Duration::from_secs(300));
        assert_eq!(config.batch_item_delay, Duration::from_millis(250));
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(10));
        assert_eq!(config.log_level, "info");
        assert!(config.log_dir.is_none());
        assert!(config.is_development());
        assert!(!config.is_production());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("HTTP_PORT", "9200"),
            ("ALLOWED_ORIGINS", " https://kiosk.example.org/ , ,http://localhost:5173"),
            ("DISCOVERY_TTL_SECS", "30"),
            ("BATCH_ITEM_DELAY_MS", "0"),
            ("LOG_DIR", "/var/log/print-bridge"),
            ("ENVIRONMENT", "production"),
        ]);
        assert_eq!(config.http_port, 9200);
        assert_eq!(
            config.allowed_origins,
            vec!["https://kiosk.example.org", "http://localhost:5173"]
        );
        assert_eq!(config.discovery_ttl, Duration::from_secs(30));
        assert_eq!(config.batch_item_delay, Duration::ZERO);
        assert_eq!(config.log_dir.as_deref(), Some("/var/log/print-bridge"));
        assert!(config.is_production());
    }

    #[test]
    fn test_unparsable_values_fall_back() {
        let config = config_from(&[
            ("HTTP_PORT", "not-a-port"),
            ("DISCOVERY_TTL_SECS", "-5"),
            ("LOG_DIR", "   "),
        ]);
        assert_eq!(config.http_port, DEFAULT_HTTP_PORT);
        assert_eq!(config.discovery_ttl, DEFAULT_TTL);
        assert!(config.log_dir.is_none());
    }
}
