use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Fixed timeout for the landing-page GET, independent of the download timeout.
pub const LANDING_TIMEOUT: Duration = Duration::from_secs(7);

/// Default timeout for the download POST, in seconds.
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 60;

/// Maximum characters kept from the stored name's base (`{id}-{name}` minus its extension).
pub const MAX_FILENAME_BASE_CHARS: usize = 200;

/// `id` of the form carrying the hidden download fields.
pub const DOWNLOAD_FORM_ID: &str = "download";

/// `id` of the anchor whose text is the suggested filename; also the activation field name.
pub const DOWNLOAD_LINK_ID: &str = "download:link_download_arquivo";

/// Total attempts for one retrieval, including the first.
pub const RETRY_MAX_ATTEMPTS: u32 = 2;

/// Fixed part of the delay before a retry, in seconds.
pub const RETRY_BASE_DELAY_SECS: u64 = 4;

/// Upper bound (exclusive) of the random jitter added to the retry delay, in seconds.
pub const RETRY_JITTER_SECS: u64 = 3;

/// Host the portal is served from.
pub const PORTAL_HOST: &str = "sucupira.capes.gov.br";

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:88.0) Gecko/20100101 Firefox/88.0";
const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const ACCEPT_DOWNLOAD: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/";
const ACCEPT_LANGUAGE: &str = "pt-BR,pt;q=0.8,en-US;q=0.5,en;q=0.3";

/// Browser fingerprint sent with every portal request. The portal rejects default client headers.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserProfile {
    pub host: String,
    pub user_agent: String,
    pub accept: String,
    /// `Accept` sent with the download POST.
    pub download_accept: String,
    pub accept_language: String,
    pub accept_encoding: String,
}

impl BrowserProfile {
    /// `Origin` header value for form submissions.
    pub fn origin(&self) -> String {
        format!("https://{}", self.host)
    }
}

impl Default for BrowserProfile {
    fn default() -> Self {
        Self {
            host: PORTAL_HOST.to_string(),
            user_agent: USER_AGENT.to_string(),
            accept: ACCEPT_HTML.to_string(),
            download_accept: ACCEPT_DOWNLOAD.to_string(),
            accept_language: ACCEPT_LANGUAGE.to_string(),
            accept_encoding: "gzip, deflate, br".to_string(),
        }
    }
}

/// Retry knobs for one retrieval.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_secs: u64,
    pub jitter_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: RETRY_MAX_ATTEMPTS,
            base_delay_secs: RETRY_BASE_DELAY_SECS,
            jitter_secs: RETRY_JITTER_SECS,
        }
    }
}

/// Top-level configuration for a bulk download.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Timeout for each download POST, in seconds.
    pub download_timeout_secs: u64,
    /// Directory the documents are written to.
    pub output_dir: PathBuf,
    /// JSON file recording processed record ids.
    pub cache_path: PathBuf,
    pub retry: RetryConfig,
    pub profile: BrowserProfile,
}

impl FetchConfig {
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            output_dir: PathBuf::from("teses"),
            cache_path: PathBuf::from("teses-cache.json"),
            retry: RetryConfig::default(),
            profile: BrowserProfile::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let cfg: FetchConfig =
            serde_json::from_str(r#"{"download_timeout_secs": 120, "retry": {"max_attempts": 3}}"#)
                .unwrap();
        assert_eq!(cfg.download_timeout(), Duration::from_secs(120));
        assert_eq!(cfg.retry.max_attempts, 3);
        assert_eq!(cfg.retry.base_delay_secs, RETRY_BASE_DELAY_SECS);
        assert_eq!(cfg.profile.host, PORTAL_HOST);
        assert_eq!(cfg.profile.origin(), "https://sucupira.capes.gov.br");
    }
}
