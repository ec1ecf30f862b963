//! # Session Negotiation

//! Acquires the CSRF token and session cookie pair the backend requires on state-changing calls.
//! The token is requested with `x-csrf-token: fetch` on the slot listing; it is scoped to the
//! endpoint, not the date, so any date whose slot query succeeds will do.

use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};
use crate::config::Settings;
use crate::errors::{DockBookingError, DockBookingResult};
use crate::models::SessionCredential;
use crate::services::backend::BackendClient;
use crate::services::slots::{slot_query, validate_date};

/// Session cookie keys the creation endpoint accepts, in the order they are sent
pub const SESSION_COOKIE_KEYS: [&str; 2] = ["SAP_SESSIONID_S4H_100", "sap-usercontext"];

/// Cookie attribute names that appear interleaved with the assignments of a `set-cookie` header
const COOKIE_ATTRIBUTES: [&str; 7] = ["path", "domain", "expires", "max-age", "secure", "httponly", "samesite"];

/// Reduces a raw `set-cookie` header to the session cookies the backend accepts on the next request.
///
/// Input contract: one or more cookie assignments separated by `,` or `;`, interleaved with
/// attributes (`path=/`, `HttpOnly`, ...). Only `key=value` pairs whose key is not an attribute name
/// are kept; a value may itself contain `=` (`sap-usercontext=sap-client=100`). When a key repeats,
/// the last assignment wins.
///
/// Output: `SAP_SESSIONID_S4H_100=<v>; sap-usercontext=<v>`, always in that order.
///
/// # Errors
///
/// * `MissingSessionCookie` naming the first required key that is absent
pub fn normalize_session_cookie(raw: &str) -> DockBookingResult<String> {
    let cookies: HashMap<&str, &str> = raw
        .split([',', ';'])
        .filter_map(|part| part.trim().split_once('='))
        .map(|(key, value)| (key.trim(), value.trim()))
        .filter(|(key, _)| !key.is_empty() && !COOKIE_ATTRIBUTES.contains(&key.to_ascii_lowercase().as_str()))
        .collect();

    SESSION_COOKIE_KEYS
        .iter()
        .map(|key| {
            cookies
                .get(key)
                .map(|value| format!("{}={}", key, value))
                .ok_or_else(|| DockBookingError::MissingSessionCookie(key.to_string()))
        })
        .collect::<DockBookingResult<Vec<_>>>()
        .map(|pairs| pairs.join("; "))
}

/// Obtains fresh session credentials. Holds no state between calls.
#[derive(Clone)]
pub struct SessionNegotiator {
    client: BackendClient,
    slot_entity_path: String,
    attempts: u32,
    retry_delay: Duration,
}

impl SessionNegotiator {
    pub fn new(settings: &Settings, client: BackendClient) -> Self {
        Self {
            client,
            slot_entity_path: format!("{}/ZDOCK_SLOT_TIMESet", settings.backend.slot_service_path),
            attempts: settings.backend.token_fetch_attempts.max(1),
            retry_delay: settings.backend.retry_delay(),
        }
    }

    /// Fetches a CSRF token and the matching session cookie
    ///
    /// The token fetch is idempotent, so transport faults and 5xx answers are retried up to
    /// `backend.token_fetch_attempts` times. A response without token or cookie is not retried.
    ///
    /// # Returns
    ///
    /// * `Ok(SessionCredential)`: Token plus normalized cookie, valid for the next state-changing call
    /// * `Err(DockBookingError::InvalidDate)`: If `reference_date` is not DDMMYYYY
    /// * `Err(DockBookingError::NoToken)`: If the response carries no `x-csrf-token`
    /// * `Err(DockBookingError::MissingSessionCookie)`: If a required session cookie is absent
    /// * `Err(DockBookingError::Transport | Upstream)`: If the last attempt failed
    pub async fn acquire_session(&self, reference_date: &str) -> DockBookingResult<SessionCredential> {
        validate_date(reference_date)?;

        let mut attempt = 1;
        let response = loop {
            let request = slot_query(&self.slot_entity_path, reference_date).header("x-csrf-token", "fetch");
            match self.client.fetch_headers(request).await {
                Ok(response) => break response,
                Err(e) if e.is_retryable() && attempt < self.attempts => {
                    warn!("Token fetch attempt {}/{} failed: {}", attempt, self.attempts, e);
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        };

        let token = response
            .header("x-csrf-token")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(DockBookingError::NoToken)?
            .to_string();
        let raw_cookie = response
            .header("set-cookie")
            .ok_or_else(|| DockBookingError::MissingSessionCookie("set-cookie".to_string()))?;
        let cookie = normalize_session_cookie(raw_cookie)?;

        info!("Session acquired after {} attempt(s)", attempt);
        Ok(SessionCredential::new(token, cookie))
    }
}
