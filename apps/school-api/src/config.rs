/// School API configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// HS256 secret used to sign and verify user tokens.
    pub jwt_secret: String,
    /// Upper bound on pooled database connections.
    pub db_max_connections: usize,
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Public origin of the API, only used for logging.
    pub base_url: Option<String>,
}

/// Pool size used when `DB_MAX_CONNECTIONS` is unset or invalid.
pub const DEFAULT_DB_MAX_CONNECTIONS: usize = 20;

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Panics with a descriptive message if a required variable is missing.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its
    /// value. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let required = |name: &str| {
            var(name).unwrap_or_else(|| panic!("{name} env var is required"))
        };

        Self {
            database_url: required("DATABASE_URL"),
            jwt_secret: required("JWT_SECRET"),
            db_max_connections: var("DB_MAX_CONNECTIONS")
                .and_then(|v| v.parse::<usize>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS),
            port: var("API_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            base_url: var("BASE_URL"),
        }
    }
}
