// Portal fetcher: landing page GET, hidden form scrape, then the form POST streamed to disk.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CONNECTION,
    CONTENT_TYPE, HOST, ORIGIN, REFERER, USER_AGENT,
};
use reqwest::cookie::Jar;
use reqwest::{Client, Response};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::html::{HtmlParser, ScraperParser};
use super::retry::RetryPolicy;
use super::traits::DocumentSource;
use crate::config::{
    BrowserProfile, FetchConfig, DOWNLOAD_FORM_ID, DOWNLOAD_LINK_ID, LANDING_TIMEOUT,
    MAX_FILENAME_BASE_CHARS,
};
use crate::error::FetchError;
use crate::model::{FetchOutcome, FormPayload, RecordId, RetrievalTarget};

/// What the landing page yields when a document is published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadForm {
    pub payload: FormPayload,
    pub filename: String,
}

pub struct PortalFetcher {
    profile: BrowserProfile,
    retry: RetryPolicy,
    parser: Arc<dyn HtmlParser>,
}

impl PortalFetcher {
    pub fn new(profile: BrowserProfile, retry: RetryPolicy) -> Self {
        Self {
            profile,
            retry,
            parser: Arc::new(ScraperParser),
        }
    }

    pub fn from_config(cfg: &FetchConfig) -> Self {
        Self::new(cfg.profile.clone(), RetryPolicy::from_config(&cfg.retry))
    }

    /// Swap the HTML parser used on landing pages.
    pub fn with_parser(mut self, parser: Arc<dyn HtmlParser>) -> Self {
        self.parser = parser;
        self
    }

    fn landing_headers(&self) -> Result<HeaderMap, FetchError> {
        let p = &self.profile;
        let mut headers = HeaderMap::new();
        put_header(&mut headers, USER_AGENT, &p.user_agent)?;
        put_header(&mut headers, ACCEPT, &p.accept)?;
        put_header(&mut headers, ACCEPT_LANGUAGE, &p.accept_language)?;
        put_header(&mut headers, ACCEPT_ENCODING, &p.accept_encoding)?;
        put_header(&mut headers, CONNECTION, "keep-alive")?;
        put_header(&mut headers, HOST, &p.host)?;
        Ok(headers)
    }

    fn download_headers(&self, referer: &str) -> Result<HeaderMap, FetchError> {
        let mut headers = self.landing_headers()?;
        put_header(&mut headers, ACCEPT, &self.profile.download_accept)?;
        put_header(&mut headers, REFERER, referer)?;
        put_header(&mut headers, ORIGIN, &self.profile.origin())?;
        put_header(
            &mut headers,
            CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        )?;
        Ok(headers)
    }

    /// Parse the landing page and pull out the download form. `None` means nothing is published.
    fn read_landing_page(&self, body: &str, id: &RecordId) -> Option<DownloadForm> {
        let doc = self.parser.parse(body);

        let Some(form) = doc.find_by_id("form", DOWNLOAD_FORM_ID) else {
            debug!("record {}: no download form on landing page", id);
            return None;
        };

        let mut payload = FormPayload::new();
        for input in doc.find_all_by_tag(&form, "input") {
            if let (Some(name), Some(value)) = (input.attr("name"), input.attr("value")) {
                payload.insert(name, value);
            }
        }
        payload.activate(DOWNLOAD_LINK_ID);

        let filename = doc
            .find_by_id("a", DOWNLOAD_LINK_ID)
            .map(|a| a.text().trim().to_string())
            .unwrap_or_default();
        if filename.is_empty() {
            debug!("record {}: download link missing or empty", id);
            return None;
        }

        Some(DownloadForm { payload, filename })
    }

    async fn fetch_once(
        &self,
        target: &RetrievalTarget,
        output_dir: &Path,
        download_timeout: Duration,
    ) -> Result<FetchOutcome, FetchError> {
        let url = target.url();
        // Fresh cookie jar per attempt, shared by both phases so the POST rides the
        // landing page's session.
        let jar = Arc::new(Jar::default());

        let resp = phase_client(&jar, LANDING_TIMEOUT)?
            .get(url)
            .headers(self.landing_headers()?)
            .send()
            .await?;
        let resp = ensure_success(resp, "landing page")?;
        let body = resp.text().await?;

        let Some(form) = self.read_landing_page(&body, target.id()) else {
            return Ok(FetchOutcome::Unavailable);
        };

        tokio::fs::create_dir_all(output_dir).await?;
        let path = output_dir.join(document_file_name(target.id(), &form.filename));

        debug!(
            "record {}: submitting {} form fields, timeout={}s",
            target.id(),
            form.payload.len(),
            download_timeout.as_secs()
        );
        let resp = phase_client(&jar, download_timeout)?
            .post(url)
            .headers(self.download_headers(url)?)
            .form(form.payload.fields())
            .send()
            .await?;
        let resp = ensure_success(resp, "download")?;

        let written = stream_to_file(resp, &path).await?;
        info!(
            "record {} saved to {} ({} bytes)",
            target.id(),
            path.display(),
            written
        );
        Ok(FetchOutcome::Saved(path))
    }
}

#[async_trait]
impl DocumentSource for PortalFetcher {
    async fn fetch(
        &self,
        target: &RetrievalTarget,
        output_dir: &Path,
        download_timeout: Duration,
    ) -> Result<FetchOutcome, FetchError> {
        let label = format!("record {}", target.id());
        self.retry
            .run(&label, move |attempt| {
                debug!("record {} attempt {} url={}", target.id(), attempt, target.url());
                self.fetch_once(target, output_dir, download_timeout)
            })
            .await
    }
}

/// Client whose `timeout` bounds connecting and each read, not the whole transfer.
fn phase_client(jar: &Arc<Jar>, timeout: Duration) -> Result<Client, FetchError> {
    let client = Client::builder()
        .cookie_provider(Arc::clone(jar))
        .connect_timeout(timeout)
        .read_timeout(timeout)
        .build()?;
    Ok(client)
}

fn put_header(headers: &mut HeaderMap, name: HeaderName, value: &str) -> Result<(), FetchError> {
    let value = HeaderValue::from_str(value)
        .map_err(|e| FetchError::Other(anyhow!("invalid {} header: {}", name, e)))?;
    headers.insert(name, value);
    Ok(())
}

fn ensure_success(resp: Response, phase: &str) -> Result<Response, FetchError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    warn!("{} failed status={} url={}", phase, status.as_u16(), resp.url());
    Err(FetchError::HttpStatus {
        status: status.as_u16(),
        url: resp.url().to_string(),
    })
}

/// Copy the response body to `path` chunk by chunk. Returns the number of bytes written.
async fn stream_to_file(mut resp: Response, path: &Path) -> Result<u64, FetchError> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut written = 0u64;
    while let Some(chunk) = resp.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

/// `{id}-{name}` with path separators replaced. The base of the whole name, id prefix
/// included, is capped at [`MAX_FILENAME_BASE_CHARS`] characters; the extension is kept.
pub fn document_file_name(id: &RecordId, suggested: &str) -> String {
    let clean: String = suggested
        .trim()
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    let full = format!("{}-{}", id, clean);
    let (base, ext) = split_extension(&full);
    let base: String = base.chars().take(MAX_FILENAME_BASE_CHARS).collect();
    format!("{}{}", base, ext)
}

/// Split off the last `.ext`. A leading or trailing dot is not an extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(i) if i > 0 && i + 1 < name.len() => name.split_at(i),
        _ => (name, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> RecordId {
        RecordId::parse(s).unwrap()
    }

    #[test]
    fn test_file_name_keeps_short_names() {
        assert_eq!(document_file_name(&id("42"), "tese.pdf"), "42-tese.pdf");
        assert_eq!(
            document_file_name(&id("42"), "  Dissertação final.pdf \n"),
            "42-Dissertação final.pdf"
        );
    }

    #[test]
    fn test_file_name_truncates_base_not_extension() {
        let suggested = format!("{}.pdf", "a".repeat(250));
        let name = document_file_name(&id("7"), &suggested);
        assert_eq!(name, format!("7-{}.pdf", "a".repeat(198)));
        assert_eq!(name.chars().count(), 204);
    }

    #[test]
    fn test_file_name_limit_includes_id_prefix() {
        let suggested = format!("{}.pdf", "b".repeat(250));
        let name = document_file_name(&id("123456"), &suggested);
        assert_eq!(name, format!("123456-{}.pdf", "b".repeat(193)));
        assert_eq!(name.chars().count(), 204);
    }

    #[test]
    fn test_file_name_counts_characters_not_bytes() {
        let suggested = format!("{}.pdf", "ç".repeat(300));
        let name = document_file_name(&id("1"), &suggested);
        assert_eq!(name, format!("1-{}.pdf", "ç".repeat(198)));
        assert_eq!(name.chars().count(), 204);
    }

    #[test]
    fn test_file_name_strips_path_separators() {
        assert_eq!(
            document_file_name(&id("9"), "../etc/passwd.pdf"),
            "9-.._etc_passwd.pdf"
        );
    }

    #[test]
    fn test_split_extension_edges() {
        assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", ".gz"));
        assert_eq!(split_extension(".pdf"), (".pdf", ""));
        assert_eq!(split_extension("name."), ("name.", ""));
        assert_eq!(split_extension("noext"), ("noext", ""));
    }

    #[test]
    fn test_read_landing_page() {
        let fetcher = PortalFetcher::new(BrowserProfile::default(), RetryPolicy::none());
        let page = r#"
            <form id="download">
              <input type="hidden" name="download" value="download">
              <input type="hidden" name="javax.faces.ViewState" value="vs1">
              <input type="submit" name="noValue">
              <input type="hidden" value="noName">
              <a id="download:link_download_arquivo"> tese.pdf </a>
            </form>
        "#;
        let form = fetcher.read_landing_page(page, &id("5")).unwrap();
        assert_eq!(form.filename, "tese.pdf");
        assert_eq!(form.payload.get("javax.faces.ViewState"), Some("vs1"));
        assert_eq!(form.payload.get(DOWNLOAD_LINK_ID), Some(DOWNLOAD_LINK_ID));
        assert_eq!(form.payload.get("noValue"), None);
        assert_eq!(form.payload.len(), 3);
    }

    #[test]
    fn test_read_landing_page_without_form_or_link() {
        let fetcher = PortalFetcher::new(BrowserProfile::default(), RetryPolicy::none());
        assert!(fetcher
            .read_landing_page("<html><body>Not found</body></html>", &id("5"))
            .is_none());
        assert!(fetcher
            .read_landing_page(
                r#"<form id="download"><input name="a" value="b"></form>"#,
                &id("5")
            )
            .is_none());
        assert!(fetcher
            .read_landing_page(
                r#"<form id="download"></form><a id="download:link_download_arquivo">  </a>"#,
                &id("5")
            )
            .is_none());
    }
}
