use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub uploads: UploadConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub reports: ReportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub session_duration_hours: i64,
    #[serde(default)]
    pub secure_cookies: bool,
    /// Whether `POST /auth/register` may create admin accounts.
    #[serde(default = "default_true")]
    pub allow_admin_registration: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    /// Directory on disk that stored files are written under.
    pub dir: String,
    /// URL prefix the stored files are served from.
    pub public_prefix: String,
    pub max_file_size_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LedgerConfig {
    /// Registration fee recorded for makers who upload a payment screenshot.
    pub registration_fee: i64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ReportConfig {
    #[serde(default)]
    pub strict_transitions: bool,
}

fn default_true() -> bool {
    true
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: "uploads".to_string(),
            public_prefix: "/uploads".to_string(),
            max_file_size_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self { registration_fee: 300 }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.base_url", "http://localhost:8080")?
            .set_default("database.url", "sqlite://assignmentpro.db?mode=rwc")?
            .set_default("database.max_connections", 10)?
            .set_default("auth.session_duration_hours", 24 * 30)?
            .set_default("auth.secure_cookies", false)?
            .set_default("auth.allow_admin_registration", true)?
            .set_default("uploads.dir", "uploads")?
            .set_default("uploads.public_prefix", "/uploads")?
            .set_default("uploads.max_file_size_bytes", 10 * 1024 * 1024)?
            .set_default("ledger.registration_fee", 300)?
            .set_default("reports.strict_transitions", false)?

            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))

            // Add environment variables (with ASSIGNMENTPRO__ prefix, double underscore separates levels)
            .add_source(Environment::with_prefix("ASSIGNMENTPRO").separator("__"))

            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                base_url: "http://localhost:8080".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite://assignmentpro.db?mode=rwc".to_string(),
                max_connections: 10,
            },
            auth: AuthConfig {
                session_duration_hours: 24 * 30,
                secure_cookies: false,
                allow_admin_registration: true,
            },
            uploads: UploadConfig::default(),
            ledger: LedgerConfig::default(),
            reports: ReportConfig::default(),
        }
    }
}
