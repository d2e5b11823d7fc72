use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Progress body POSTed to the tracking endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub video_id: String,
    pub current_time: f64,
    pub duration: f64,
}

/// Destination for progress telemetry
#[async_trait::async_trait]
pub trait ProgressReporter: Send + Sync {
    async fn report(&self, report: &ProgressReport) -> Result<()>;
}

/// Reporter that POSTs JSON to the `video-tracking` endpoint
pub struct HttpProgressReporter {
    client: Client,
    endpoint: String,
    user_id: Option<String>,
}

impl HttpProgressReporter {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            user_id: None,
        })
    }

    /// Identify the viewer to the endpoint (sent as `x-user-id`)
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

#[async_trait::async_trait]
impl ProgressReporter for HttpProgressReporter {
    async fn report(&self, report: &ProgressReport) -> Result<()> {
        let mut request = self.client.post(&self.endpoint).json(report);
        if let Some(user_id) = &self.user_id {
            request = request.header("x-user-id", user_id);
        }

        let response = request
            .send()
            .await
            .context("Failed to send video progress")?;

        let status = response.status();
        if !status.is_success() {
            bail!("Failed to save video progress ({})", status);
        }

        debug!(
            "Saved progress for {} ({:.1}s / {:.1}s)",
            report.video_id, report.current_time, report.duration
        );

        Ok(())
    }
}
