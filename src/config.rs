use crate::Coord;
use crate::errors::WidgetError;
use serde::Deserialize;
use std::time::Duration;

/// Moscow, the fallback map center when the embedder does not supply one.
pub const DEFAULT_CENTER: Coord = Coord {
    lat: 55.751244,
    lon: 37.618423,
};

fn default_lang() -> String {
    "ru_RU".to_string()
}

fn default_center() -> Coord {
    DEFAULT_CENTER
}

fn default_zoom() -> u8 {
    8
}

fn default_suggest_limit() -> usize {
    6
}

fn default_min_query_len() -> usize {
    3
}

fn default_debounce_ms() -> u64 {
    220
}

fn default_blur_grace_ms() -> u64 {
    150
}

/// Widget tuning. Everything except the API key has a sensible default.
///
/// `min_query_len` is deliberately configurable: deployments disagree on
/// whether single-character queries are worth the suggest traffic.
#[derive(Clone, Debug, Deserialize)]
pub struct WidgetConfig {
    pub api_key: String,
    #[serde(default = "default_lang")]
    pub lang: String,
    #[serde(default = "default_center")]
    pub center: Coord,
    #[serde(default = "default_zoom")]
    pub zoom: u8,
    /// Maximum number of dropdown suggestions requested per query.
    #[serde(default = "default_suggest_limit")]
    pub suggest_limit: usize,
    /// Minimum trimmed input length before a suggest query is scheduled.
    #[serde(default = "default_min_query_len")]
    pub min_query_len: usize,
    /// Keystroke quiet period before the suggest query fires.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Delay between blur and dropdown close, so a click on a dropdown item
    /// is not preempted.
    #[serde(default = "default_blur_grace_ms")]
    pub blur_grace_ms: u64,
    /// Location of the static marker overlay GeoJSON, if any.
    #[serde(default)]
    pub overlay_url: Option<String>,
}

impl WidgetConfig {
    pub fn new(api_key: impl Into<String>) -> Result<Self, WidgetError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(WidgetError::Config(
                "missing map provider API key".to_string(),
            ));
        }
        Ok(WidgetConfig {
            api_key,
            lang: default_lang(),
            center: default_center(),
            zoom: default_zoom(),
            suggest_limit: default_suggest_limit(),
            min_query_len: default_min_query_len(),
            debounce_ms: default_debounce_ms(),
            blur_grace_ms: default_blur_grace_ms(),
            overlay_url: None,
        })
    }

    /// Reads `TRANSTIME_*` variables. Only the API key is required.
    pub fn from_env() -> Result<Self, WidgetError> {
        let api_key = std::env::var("TRANSTIME_API_KEY")
            .map_err(|_| WidgetError::Config("TRANSTIME_API_KEY is not set".to_string()))?;
        let mut config = WidgetConfig::new(api_key)?;
        if let Ok(lang) = std::env::var("TRANSTIME_LANG") {
            config.lang = lang;
        }
        if let Ok(value) = std::env::var("TRANSTIME_MIN_QUERY_LEN")
            && let Ok(len) = value.parse()
        {
            config.min_query_len = len;
        }
        if let Ok(url) = std::env::var("TRANSTIME_OVERLAY_URL") {
            config.overlay_url = Some(url);
        }
        Ok(config)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn blur_grace(&self) -> Duration {
        Duration::from_millis(self.blur_grace_ms)
    }
}
