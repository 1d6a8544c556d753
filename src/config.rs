use serde::Deserialize;

const DEFAULT_COMPLETION_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_COMPLETION_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    /// Bearer credential for the completion service. The assistant reports an
    /// error on every request while this is unset.
    pub completion_api_key: Option<String>,
    pub completion_base_url: String,
    pub completion_model: String,
    pub completion_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_source(|key| std::env::var(key).ok())?;

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Completion Base URL: {}", config.completion_base_url);
        tracing::debug!("Completion Model: {}", config.completion_model);
        if config.completion_api_key.is_none() {
            tracing::warn!("COMPLETION_API_KEY not set, assistant replies will carry an error");
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_source<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            port: non_blank("PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            completion_api_key: non_blank("COMPLETION_API_KEY")
                .or_else(|| non_blank("OPENAI_API_KEY")),
            completion_base_url: non_blank("COMPLETION_BASE_URL")
                .map(|raw| {
                    let parsed = url::Url::parse(&raw).map_err(|e| {
                        anyhow::anyhow!("COMPLETION_BASE_URL is not a valid URL: {}", e)
                    })?;
                    if parsed.scheme() != "http" && parsed.scheme() != "https" {
                        anyhow::bail!("COMPLETION_BASE_URL must start with http:// or https://");
                    }
                    Ok(raw.trim_end_matches('/').to_string())
                })
                .transpose()?
                .unwrap_or_else(|| DEFAULT_COMPLETION_BASE_URL.to_string()),
            completion_model: non_blank("COMPLETION_MODEL")
                .unwrap_or_else(|| DEFAULT_COMPLETION_MODEL.to_string()),
            completion_timeout_secs: non_blank("COMPLETION_TIMEOUT_SECS")
                .unwrap_or_else(|| "30".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("COMPLETION_TIMEOUT_SECS must be a whole number"))?,
        })
    }
}
