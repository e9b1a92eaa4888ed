//! Server configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// Max pooled PostgreSQL connections
    pub database_max_connections: u32,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// HS256 secret for session tokens
    pub jwt_secret: String,
    /// AES-256 key for stored platform credentials (base64, 32 bytes)
    pub credential_key: String,
    /// Audit channel capacity
    pub audit_buffer_size: usize,
    /// `json` for machine-readable logs
    pub log_format: Option<String>,
    /// Superadmin created at startup when no account with this name exists
    pub bootstrap_superadmin: Option<(String, String)>,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
        std::env::var(name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let bootstrap_superadmin = match (
            std::env::var("BOOTSTRAP_SUPERADMIN_USERNAME"),
            std::env::var("BOOTSTRAP_SUPERADMIN_PASSWORD"),
        ) {
            (Ok(u), Ok(p)) if !u.is_empty() && !p.is_empty() => Some((u, p)),
            _ => None,
        };

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            database_max_connections: Self::parse_or("DATABASE_MAX_CONNECTIONS", 10),
            http_port: Self::parse_or("HTTP_PORT", 8080),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            credential_key: Self::require_secret("CREDENTIAL_KEY", &environment)?,
            audit_buffer_size: Self::parse_or("AUDIT_BUFFER_SIZE", 1024),
            log_format: std::env::var("LOG_FORMAT").ok().filter(|s| !s.is_empty()),
            bootstrap_superadmin,
            environment,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Session cookies carry `Secure` everywhere except local development
    pub fn secure_cookies(&self) -> bool {
        !self.is_development()
    }
}
