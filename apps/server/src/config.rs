//! Server configuration loaded from the environment.
//!
//! `.env` files are honored in development (via dotenvy in main).
//!
//! ## Variables
//! | Variable            | Default            | Purpose                      |
//! |---------------------|--------------------|------------------------------|
//! | `DATABASE_PATH`     | `./bazaar_dev.db`  | SQLite file location         |
//! | `BIND_ADDR`         | `0.0.0.0:8080`     | Listen address               |
//! | `JWT_SECRET`        | (required)         | HS256 signing secret         |
//! | `TOKEN_LIFETIME_SECS` | `86400`          | Access token lifetime        |

use std::env;

/// Runtime configuration for the Bazaar server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Path to the SQLite database file.
    pub database_path: String,

    /// Address to bind the HTTP listener to.
    pub bind_addr: String,

    /// Secret used to sign and verify JWTs.
    pub jwt_secret: String,

    /// Access token lifetime in seconds.
    pub token_lifetime_secs: i64,
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// ## Errors
    /// Fails if `JWT_SECRET` is unset: tokens signed with a guessable
    /// default would authenticate anyone.
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set (see .env.example)"))?;

        let token_lifetime_secs = match env::var("TOKEN_LIFETIME_SECS") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| anyhow::anyhow!("TOKEN_LIFETIME_SECS must be an integer"))?,
            Err(_) => 86_400,
        };

        Ok(ServerConfig {
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "./bazaar_dev.db".to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            jwt_secret,
            token_lifetime_secs,
        })
    }
}
