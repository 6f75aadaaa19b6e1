/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `JWT_SECRET`: Secret key for JWT signing (required, >= 32 bytes)
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: `*`)
/// - `INVITE_LINK_BASE`: Base URL for invite accept links
/// - `RAZORPAY_KEY_ID` / `RAZORPAY_KEY_SECRET`: enable the Razorpay gateway
/// - `CASHFREE_CLIENT_ID` / `CASHFREE_SECRET_KEY`: enable the Cashfree
///   gateway; `CASHFREE_BASE_URL` and `CASHFREE_RETURN_URL` tune it
/// - Push and email settings are read by the shared `PushConfig` and
///   `EmailConfig` loaders
///
/// # Example
///
/// ```no_run
/// use taskhive_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```
use std::env;

use taskhive_shared::email::EmailConfig;
use taskhive_shared::push::PushConfig;

/// Cashfree sandbox API base
const DEFAULT_CASHFREE_BASE_URL: &str = "https://sandbox.cashfree.com/pg";

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Razorpay gateway, absent when not configured
    pub razorpay: Option<RazorpayConfig>,

    /// Cashfree gateway, absent when not configured
    pub cashfree: Option<CashfreeConfig>,

    /// Push provider configuration
    pub push: PushConfig,

    /// Transactional email configuration
    pub email: EmailConfig,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` means permissive
    pub cors_origins: Vec<String>,

    /// Base URL invite accept links point at
    pub invite_link_base: String,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Must be at least 32 bytes. Generate with: `openssl rand -hex 32`
    pub secret: String,
}

/// Razorpay gateway credentials
#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    pub key_id: String,

    /// Signs gateway orders and verifies checkout signatures
    pub key_secret: String,
}

/// Cashfree gateway credentials
#[derive(Debug, Clone)]
pub struct CashfreeConfig {
    pub client_id: String,
    pub client_secret: String,

    /// Gateway API base, sandbox by default
    pub base_url: String,

    /// Where the gateway redirects after checkout, unless the request
    /// supplies its own URL
    pub return_url: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` is missing, `JWT_SECRET` is
    /// missing or shorter than 32 bytes, or a numeric variable fails to
    /// parse. Gateway, push and email settings are optional; their
    /// features are disabled when absent.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let invite_link_base = env::var("INVITE_LINK_BASE")
            .unwrap_or_else(|_| "http://localhost:8080/invites".to_string());

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let razorpay = match (env::var("RAZORPAY_KEY_ID"), env::var("RAZORPAY_KEY_SECRET")) {
            (Ok(key_id), Ok(key_secret)) => Some(RazorpayConfig { key_id, key_secret }),
            _ => None,
        };

        let cashfree = match (
            env::var("CASHFREE_CLIENT_ID"),
            env::var("CASHFREE_SECRET_KEY"),
        ) {
            (Ok(client_id), Ok(client_secret)) => Some(CashfreeConfig {
                client_id,
                client_secret,
                base_url: env::var("CASHFREE_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_CASHFREE_BASE_URL.to_string()),
                return_url: env::var("CASHFREE_RETURN_URL").ok(),
            }),
            _ => None,
        };

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
                invite_link_base,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig { secret: jwt_secret },
            razorpay,
            cashfree,
            push: PushConfig::from_env(),
            email: EmailConfig::from_env(),
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                cors_origins: vec!["*".to_string()],
                invite_link_base: "http://localhost:8080/invites".to_string(),
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/test".to_string(),
                max_connections: 10,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
            },
            razorpay: None,
            cashfree: None,
            push: PushConfig::default(),
            email: EmailConfig::default(),
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(test_config().bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_gateways_default_off() {
        let config = test_config();
        assert!(config.razorpay.is_none());
        assert!(config.cashfree.is_none());
    }
}
