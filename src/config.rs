use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Absent means the in-memory backend (local runs, tests).
    pub database_url: Option<String>,
    pub bind_addr: String,
    /// When set, an unconfigured rate is a hard error instead of a logged
    /// zero fallback.
    pub strict_rates: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env::var("DATABASE_URL").ok();

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let strict_rates = match env::var("STRICT_RATES") {
            Ok(v) => parse_bool(&v).ok_or_else(|| format!("STRICT_RATES must be a boolean, got '{v}'"))?,
            Err(_) => false,
        };

        Ok(Self {
            database_url,
            bind_addr,
            strict_rates,
        })
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.to_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}
