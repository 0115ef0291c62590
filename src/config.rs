//! Runtime configuration from flags, environment and `.env`.

use clap::Parser;
use std::path::Path;

/// Signing secret used when none is configured. Development only.
pub const DEV_JWT_SECRET: &str = "totem-dev-secret-change-me";

#[derive(Debug, Clone, Parser)]
#[command(name = "totem")]
#[command(about = "Totem café ordering backend")]
pub struct Config {
    /// Address the HTTP server binds to
    #[arg(long, env = "TOTEM_BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind_addr: String,

    /// Path to SQLite database
    #[arg(long, env = "TOTEM_DB_PATH", default_value = "totem.db")]
    pub db_path: String,

    /// HMAC secret for signing tokens
    #[arg(long, env = "JWT_SECRET", default_value = DEV_JWT_SECRET, hide_env_values = true)]
    pub jwt_secret: String,

    /// Token lifetime in minutes
    #[arg(long, env = "JWT_EXPIRATION_MINUTES", default_value = "1440")]
    pub jwt_expiration_minutes: i64,

    #[arg(long, env = "BCRYPT_COST", default_value_t = bcrypt::DEFAULT_COST)]
    pub bcrypt_cost: u32,

    /// Password reset token lifetime in minutes
    #[arg(long, env = "PASSWORD_RESET_TTL_MINUTES", default_value = "30")]
    pub reset_ttl_minutes: i64,

    #[arg(long, env = "TOTEM_ADMIN_NAME", default_value = "Administrator")]
    pub admin_name: String,

    /// Bootstrap admin, created when no ADMIN manager exists
    #[arg(long, env = "TOTEM_ADMIN_EMAIL", default_value = "admin@totem.local")]
    pub admin_email: String,

    #[arg(long, env = "TOTEM_ADMIN_PASSWORD", default_value = "admin123", hide_env_values = true)]
    pub admin_password: String,
}

impl Config {
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    pub fn uses_default_admin_password(&self) -> bool {
        self.admin_password == "admin123"
    }
}

/// Load `.env` from the working directory (and parents), then from the
/// crate root.
pub fn load_env() {
    let _ = dotenv::dotenv();

    let manifest_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if manifest_env.exists() {
        let _ = dotenv::from_path(&manifest_env);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["totem"]).unwrap();

        assert_eq!(config.jwt_expiration_minutes, 1440);
        assert_eq!(config.reset_ttl_minutes, 30);
        assert_eq!(config.admin_email, "admin@totem.local");
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = Config::try_parse_from([
            "totem",
            "--bind-addr",
            "127.0.0.1:9000",
            "--jwt-secret",
            "prod-secret",
            "--bcrypt-cost",
            "6",
        ])
        .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.bcrypt_cost, 6);
        assert!(!config.uses_dev_secret());
    }
}
