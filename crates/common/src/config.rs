/// All configuration loaded from environment variables at startup.
/// Missing required variables cause an immediate panic with a clear message.
#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: String,

    // Method (fusion configuration) file path
    pub method_config_path: String,

    // Scan loop
    pub scan_interval_secs: u64,

    // Tracking sweep
    pub sweep_interval_secs: u64,
    pub sweep_cutoff_hours: i64,
    pub sweep_batch_size: i64,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present. Panics on any missing required variable.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        Config {
            database_url: required_env("DATABASE_URL"),
            method_config_path: optional_env("METHOD_CONFIG_PATH")
                .unwrap_or_else(|| "config/methods.toml".to_string()),
            scan_interval_secs: optional_env("SCAN_INTERVAL_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            sweep_interval_secs: optional_env("SWEEP_INTERVAL_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
            sweep_cutoff_hours: optional_env("SWEEP_CUTOFF_HOURS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(24),
            sweep_batch_size: optional_env("SWEEP_BATCH_SIZE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(500),
        }
    }
}

fn required_env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        panic!("Required environment variable '{key}' is not set. Check your .env file.")
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
