use std::env;

/// Application configuration parsed from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// "postgres" or "inmemory"
    pub store_type: String,
    /// Required when `store_type == "postgres"`
    pub database_url: Option<String>,
    /// "live" (Paystack + Stripe credentials from env) or "mock"
    pub gateway_mode: String,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let store_type = env::var("STORE_TYPE").unwrap_or_else(|_| "postgres".to_string());

        let database_url = env::var("DATABASE_URL").ok();
        if store_type == "postgres" && database_url.is_none() {
            return Err("DATABASE_URL must be set when STORE_TYPE=postgres".to_string());
        }

        let gateway_mode = env::var("GATEWAY_MODE").unwrap_or_else(|_| "live".to_string());

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port: u16 = env::var("PORT")
            .unwrap_or_else(|_| "8091".to_string())
            .parse()
            .map_err(|_| "PORT must be a valid u16".to_string())?;

        Ok(Config {
            store_type,
            database_url,
            gateway_mode,
            host,
            port,
        })
    }
}
