use std::sync::Arc;
use tracing::{debug, warn};
use crate::errors::{DockBookingError, DockBookingResult};
use crate::models::ParsedEnvelope;
use super::{parse_envelope, BackendRequest, BackendResponse, BackendTransport};

/// Low-level client for the booking backend.
///
/// Stateless between calls: every request goes straight to the transport, non-success statuses
/// become `Upstream` faults carrying the raw body, and success bodies are parsed into a [`ParsedEnvelope`].
#[derive(Clone)]
pub struct BackendClient {
    transport: Arc<dyn BackendTransport>,
}

impl BackendClient {
    pub fn new(transport: Arc<dyn BackendTransport>) -> Self {
        Self { transport }
    }

    /// Sends a request and parses the response envelope
    ///
    /// # Returns
    ///
    /// * `Ok(ParsedEnvelope)`: The entities of a 2xx response, in backend order
    /// * `Err(DockBookingError::Transport)`: If the request never got an HTTP answer
    /// * `Err(DockBookingError::Upstream)`: If the backend answered with a non-success status
    /// * `Err(DockBookingError::Parse)`: If the body is not a well-formed envelope
    pub async fn request(&self, request: BackendRequest) -> DockBookingResult<ParsedEnvelope> {
        let response = self.send_checked(request).await?;
        let envelope = parse_envelope(&response.body)?;
        debug!("Parsed {} record(s) from backend response", envelope.records.len());
        Ok(envelope)
    }

    /// Sends a request and returns the raw response of a 2xx answer without parsing its body.
    /// Used where only the response headers matter.
    pub async fn fetch_headers(&self, request: BackendRequest) -> DockBookingResult<BackendResponse> {
        self.send_checked(request).await
    }

    async fn send_checked(&self, request: BackendRequest) -> DockBookingResult<BackendResponse> {
        let method = request.method;
        let target = request.path_and_query();

        let response = self.transport.send(request).await.map_err(|e| {
            warn!("{} {} failed: {}", method, target, e);
            e
        })?;

        if !response.is_success() {
            warn!("{} {} returned HTTP {}", method, target, response.status);
            return Err(DockBookingError::Upstream {
                status: response.status,
                body: response.body,
            });
        }

        debug!("{} {} returned HTTP {}", method, target, response.status);
        Ok(response)
    }
}
