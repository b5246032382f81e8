use std::time::Duration;

use tender_core::DocumentBlob;

use crate::DownloadError;

/// Name an attachment is known by: the last path segment of its URL, with
/// query and fragment removed. No percent-decoding.
pub fn attachment_name(url: &str) -> String {
    let path = url.split('#').next().unwrap_or(url);
    let path = path.split('?').next().unwrap_or(path);
    path.rsplit('/').next().unwrap_or(path).to_string()
}

/// Fetches attachments with a fixed per-request timeout.
#[derive(Clone)]
pub struct Downloader {
    client: reqwest::Client,
    timeout: Duration,
}

impl Downloader {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Download `url` into a blob named after [`attachment_name`].
    /// Only a 2xx status yields a blob.
    pub async fn fetch(&self, url: &str) -> Result<DocumentBlob, DownloadError> {
        let resp = self.client.get(url).timeout(self.timeout).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DownloadError::Status(status));
        }
        let bytes = resp.bytes().await?;
        tracing::debug!(url, bytes = bytes.len(), "attachment downloaded");
        Ok(DocumentBlob::new(attachment_name(url), bytes.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_segment() {
        assert_eq!(
            attachment_name("https://tanmia.ma/wp-content/uploads/2026/10/CPS.pdf"),
            "CPS.pdf"
        );
    }

    #[test]
    fn query_and_fragment_stripped() {
        assert_eq!(
            attachment_name("https://x.ma/files/annexes.zip?ver=2#top"),
            "annexes.zip"
        );
        assert_eq!(attachment_name("https://x.ma/a.xlsx#sheet"), "a.xlsx");
    }

    #[test]
    fn percent_encoding_kept() {
        assert_eq!(
            attachment_name("https://x.ma/Avis%20d%27appel.pdf"),
            "Avis%20d%27appel.pdf"
        );
    }

    #[test]
    fn trailing_slash_is_empty_name() {
        assert_eq!(attachment_name("https://x.ma/download/"), "");
    }
}
