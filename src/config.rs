use serde::Serialize;
use std::env;
use utoipa::ToSchema;

/// Admin password used locally when `ADMIN_PASSWORD` is unset.
pub const LOCAL_ADMIN_PASSWORD: &str = "local-admin-password";

/// AppConfig
///
/// Holds the application's entire configuration state. Loaded once at startup
/// and immutable afterwards; handlers reach it through `FromRef`.
#[derive(Clone)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and which values are mandatory.
    pub env: Env,
    // Postgres connection string. `None` (local only) runs on the in-memory repository.
    pub db_url: Option<String>,
    // The secret every create/update/delete must present.
    pub admin_password: String,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Populate the catalog with the demo categories and items at startup.
    pub seed_demo_data: bool,
}

/// Env
///
/// Defines the runtime context: local development (pretty logs, fallbacks
/// allowed) or production (JSON logs, every secret explicit).
#[derive(Clone, PartialEq, Debug, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Env {
    Local,
    Production,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("db_url", &self.db_url.as_ref().map(|_| "<set>"))
            .field("bind_addr", &self.bind_addr)
            .field("seed_demo_data", &self.seed_demo_data)
            .finish_non_exhaustive()
    }
}

impl Default for AppConfig {
    /// default
    ///
    /// A non-panicking configuration for tests: local, in-memory, a known admin
    /// password.
    fn default() -> Self {
        Self {
            env: Env::Local,
            db_url: None,
            admin_password: "test-admin-password".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            seed_demo_data: false,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads every parameter from the environment. Call after `dotenv`.
    ///
    /// # Panics
    /// Panics in production if `ADMIN_PASSWORD` or `DATABASE_URL` is missing,
    /// or if `ADMIN_PASSWORD` is set but empty in any environment.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let admin_password = match env {
            Env::Production => env::var("ADMIN_PASSWORD")
                .expect("FATAL: ADMIN_PASSWORD must be set in production."),
            Env::Local => {
                env::var("ADMIN_PASSWORD").unwrap_or_else(|_| LOCAL_ADMIN_PASSWORD.to_string())
            }
        };
        assert!(
            !admin_password.is_empty(),
            "FATAL: ADMIN_PASSWORD must not be empty."
        );

        let db_url = match env {
            Env::Production => Some(
                env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in prod"),
            ),
            Env::Local => env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
        };

        Self {
            env,
            db_url,
            admin_password,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            seed_demo_data: env::var("SEED_DEMO_DATA")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
        }
    }
}
