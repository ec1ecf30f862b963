use std::time::Duration;
use reqwest::Client;
use tokio::time::interval;
use tracing::{info, warn};
use url::Url;
use crate::config::KeepAliveSettings;
use crate::errors::{DockBookingError, DockBookingResult};

/// Periodically pings the service's own public URL so the hosting platform keeps it awake.
/// Shares no state with the booking services.
#[derive(Clone)]
pub struct KeepAliveWorker {
    client: Client,
    url: String,
    period: Duration,
}

impl KeepAliveWorker {
    /// Creates the worker, or `None` when no keep-alive URL is configured
    pub fn from_settings(settings: &KeepAliveSettings) -> DockBookingResult<Option<Self>> {
        let Some(target) = settings.url.as_deref().map(str::trim).filter(|target| !target.is_empty()) else {
            info!("No keep-alive URL configured; self-ping disabled");
            return Ok(None);
        };
        Url::parse(target)
            .map_err(|e| DockBookingError::ConfigError(format!("keep_alive.url '{}' is not a valid URL: {}", target, e)))?;

        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| DockBookingError::ConfigError(format!("Failed to build keep-alive HTTP client: {}", e)))?;

        Ok(Some(Self {
            client,
            url: target.to_string(),
            period: Duration::from_secs(settings.interval_secs),
        }))
    }

    /// Pings forever. Failures are logged and never end the loop.
    pub async fn run(&self) {
        let mut ticker = interval(self.period);
        info!("Keep-alive pinging {} every {:?}", self.url, self.period);
        loop {
            ticker.tick().await;
            match self.ping().await {
                Ok(status) => info!("Pinged {} | Status: {}", self.url, status),
                Err(e) => warn!("Ping failed: {}", e),
            }
        }
    }

    pub async fn ping(&self) -> DockBookingResult<u16> {
        let response = self.client.get(&self.url).send().await?;
        Ok(response.status().as_u16())
    }
}
