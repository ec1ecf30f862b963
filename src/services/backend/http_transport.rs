use std::collections::HashMap;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use tracing::{debug, warn};
use url::Url;
use crate::config::BackendSettings;
use crate::errors::{DockBookingError, DockBookingResult};
use super::{BackendHost, BackendRequest, BackendResponse, BackendTransport, HttpMethod};

/// `reqwest` backed transport to the OData backend.
///
/// Every request carries HTTP basic auth. TLS certificate validation follows
/// `backend.accept_invalid_certs`; the production backend presents a self-signed certificate,
/// so validation is off there. That is a known risk of the deployment.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    read_base: Url,
    write_base: Url,
    username: String,
    password: Secret<String>,
}

impl HttpTransport {
    /// Builds the transport from the backend settings
    ///
    /// # Returns
    ///
    /// * `Ok(Self)`: The configured transport
    /// * `Err(DockBookingError::ConfigError)`: If a base URL is invalid or the HTTP client cannot be built
    pub fn new(settings: &BackendSettings) -> DockBookingResult<Self> {
        if settings.accept_invalid_certs {
            warn!("TLS certificate validation is disabled for the booking backend");
        }
        let client = Client::builder()
            .danger_accept_invalid_certs(settings.accept_invalid_certs)
            .timeout(settings.timeout())
            .build()
            .map_err(|e| DockBookingError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            read_base: parse_base(&settings.read_base_url)?,
            write_base: parse_base(&settings.write_base_url)?,
            username: settings.username.clone(),
            password: settings.password.clone(),
        })
    }

    fn url_for(&self, request: &BackendRequest) -> DockBookingResult<Url> {
        let base = match request.host {
            BackendHost::Read => &self.read_base,
            BackendHost::Write => &self.write_base,
        };
        let mut url = Url::parse(&format!("{}{}", base.as_str().trim_end_matches('/'), request.path))
            .map_err(|e| DockBookingError::InvalidInput(format!("Invalid backend path '{}': {}", request.path, e)))?;
        if !request.query.is_empty() {
            // `set_query` percent-encodes spaces and quotes, which is the spelling OData expects
            let query = request.query
                .iter()
                .map(|(key, value)| format!("{}={}", key, value))
                .collect::<Vec<_>>()
                .join("&");
            url.set_query(Some(&query));
        }
        Ok(url)
    }
}

fn parse_base(raw: &str) -> DockBookingResult<Url> {
    Url::parse(raw).map_err(|e| DockBookingError::ConfigError(format!("Invalid backend URL '{}': {}", raw, e)))
}

#[async_trait]
impl BackendTransport for HttpTransport {
    async fn send(&self, request: BackendRequest) -> DockBookingResult<BackendResponse> {
        let url = self.url_for(&request)?;
        debug!("{} {} ({} host)", request.method, url.path(), request.host);

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
        }
        .basic_auth(&self.username, Some(self.password.expose_secret()));

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| DockBookingError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let mut headers: HashMap<String, String> = HashMap::new();
        for (name, value) in response.headers() {
            let Ok(value) = value.to_str() else { continue };
            headers
                .entry(name.as_str().to_ascii_lowercase())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }
        let body = response
            .text()
            .await
            .map_err(|e| DockBookingError::Transport(e.to_string()))?;

        Ok(BackendResponse { status, headers, body })
    }
}
