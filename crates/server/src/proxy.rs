//! Download-URL proxying.
//!
//! When a proxy base URL is configured, the scheme and host (and port) of
//! every outgoing download URL are replaced with the proxy's, preserving the
//! original path and query. Any parse failure falls back to the original URL.

use url::Url;

/// Rewrites download URLs onto a configured proxy origin.
#[derive(Clone, Debug)]
pub struct DownloadProxy {
    base: Url,
}

impl DownloadProxy {
    /// Parse the proxy base URL. Only its scheme/host/port are used.
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        let base = Url::parse(base_url)?;
        if !base.has_host() {
            return Err(url::ParseError::EmptyHost);
        }
        Ok(Self { base })
    }

    /// Replace scheme+host of `download_url` with the proxy's, keeping path
    /// and query. On any parse error the original URL stands.
    pub fn rewrite(&self, download_url: &str) -> String {
        match self.try_rewrite(download_url) {
            Some(rewritten) => rewritten,
            None => {
                tracing::warn!(download_url, "could not rewrite download URL onto proxy");
                download_url.to_string()
            }
        }
    }

    fn try_rewrite(&self, download_url: &str) -> Option<String> {
        let mut url = Url::parse(download_url).ok()?;
        url.set_scheme(self.base.scheme()).ok()?;
        url.set_host(Some(self.base.host_str()?)).ok()?;
        url.set_port(self.base.port()).ok()?;
        Some(url.into())
    }
}
