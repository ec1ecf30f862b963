//! # Session Credentials

//! The CSRF token and session cookie pair the backend requires on the appointment creation POST.

use std::fmt;
use secrecy::{ExposeSecret, Secret};

/// Token and normalized cookie obtained for exactly one booking attempt.
/// Consumed by the creation call; never cached or reused.
pub struct SessionCredential {
    csrf_token: Secret<String>,
    session_cookie: Secret<String>,
}

impl SessionCredential {
    pub fn new(csrf_token: String, session_cookie: String) -> Self {
        Self {
            csrf_token: Secret::new(csrf_token),
            session_cookie: Secret::new(session_cookie),
        }
    }

    pub fn csrf_token(&self) -> &str {
        self.csrf_token.expose_secret()
    }

    pub fn session_cookie(&self) -> &str {
        self.session_cookie.expose_secret()
    }

    /// Consumes the credential, yielding the header pairs for the state-changing request
    pub fn into_headers(self) -> Vec<(String, String)> {
        vec![
            ("x-csrf-token".to_string(), self.csrf_token.expose_secret().clone()),
            ("Cookie".to_string(), self.session_cookie.expose_secret().clone()),
        ]
    }
}

impl fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredential")
            .field("csrf_token", &"[REDACTED]")
            .field("session_cookie", &"[REDACTED]")
            .finish()
    }
}
