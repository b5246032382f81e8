use std::time::Duration;

use tender_core::TenderRecord;

use crate::DeliveryError;

/// Outcome of a delivery batch.
#[derive(Debug, Default)]
pub struct DeliveryReport {
    pub sent: usize,
    /// Record URL and the reason it was not accepted.
    pub failed: Vec<(String, DeliveryError)>,
}

/// JSON POST of tender records to an automation webhook.
pub struct Webhook {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl Webhook {
    pub fn new(client: reqwest::Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            timeout,
        }
    }

    /// POST one record. Any non-2xx status is an error.
    pub async fn send(&self, record: &TenderRecord) -> Result<(), DeliveryError> {
        if self.url.is_empty() {
            return Err(DeliveryError::NoUrl);
        }
        let resp = self
            .client
            .post(&self.url)
            .json(record)
            .timeout(self.timeout)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DeliveryError::Status(status));
        }
        Ok(())
    }

    /// Deliver `records` in order, waiting `delay` between consecutive posts.
    /// A failed delivery is logged and the batch continues.
    pub async fn send_all(&self, records: &[TenderRecord], delay: Duration) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        let total = records.len();

        for (i, record) in records.iter().enumerate() {
            if i > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            match self.send(record).await {
                Ok(()) => {
                    tracing::info!(index = i + 1, total, title = %record.title, "record delivered");
                    report.sent += 1;
                }
                Err(e) => {
                    tracing::warn!(index = i + 1, total, title = %record.title, error = %e, "delivery failed");
                    report.failed.push((record.url.clone(), e));
                }
            }
        }
        report
    }
}
