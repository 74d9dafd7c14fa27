use std::env;

/// Service endpoints, overridable from the environment. Both upstreams have
/// well-known public defaults, so nothing here is required.
#[derive(Debug, Clone)]
pub struct Config {
    pub appview_url: String,
    pub plc_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            appview_url: env::var("SKYLENS_APPVIEW_URL")
                .unwrap_or_else(|_| "https://public.api.bsky.app".to_string()),
            plc_url: env::var("SKYLENS_PLC_URL")
                .unwrap_or_else(|_| "https://plc.directory".to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
