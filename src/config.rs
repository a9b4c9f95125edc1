use serde::Deserialize;

/// Environment variables that can enable mock mode, checked in order.
/// The first one that is set to a non-empty value wins.
const MOCK_MODE_VARS: [&str; 3] = ["MOCK_MODE", "B2B_MOCK_MODE", "GATEWAY_MOCK_MODE"];

const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_MOCK_DATA_PATH: &str = "public/mock-data.json";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub backend_url: String,
    pub port: u16,
    pub mock_mode: bool,
    pub mock_data_path: String,
    pub environment: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            backend_url: std::env::var("BACKEND_URL")
                .or_else(|_| std::env::var("API_BASE_URL"))
                .unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            mock_mode: resolve_mock_mode(),
            mock_data_path: std::env::var("MOCK_DATA_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MOCK_DATA_PATH.to_string()),
            environment: std::env::var("APP_ENV")
                .unwrap_or_else(|_| "development".to_string()),
        };

        let parsed = url::Url::parse(&config.backend_url)
            .map_err(|e| anyhow::anyhow!("BACKEND_URL is not a valid URL: {}", e))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            anyhow::bail!("BACKEND_URL must start with http:// or https://");
        }

        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Backend URL: {}", config.backend_url);
        tracing::debug!("Server Port: {}", config.port);
        if config.mock_mode {
            tracing::info!("Mock mode enabled, fixture: {}", config.mock_data_path);
        }

        Ok(config)
    }

    /// Diagnostic detail on the auth-status failure path is suppressed in
    /// production.
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

/// Resolves the process-wide mock-mode flag from the first set, non-empty
/// variable in `MOCK_MODE_VARS`.
fn resolve_mock_mode() -> bool {
    MOCK_MODE_VARS
        .iter()
        .find_map(|name| std::env::var(name).ok().filter(|v| !v.trim().is_empty()))
        .map(|v| parse_mock_flag(&v))
        .unwrap_or(false)
}

/// `"1"` and `"true"` (case-insensitive) enable mock mode; everything else
/// disables it.
pub fn parse_mock_flag(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true")
}
