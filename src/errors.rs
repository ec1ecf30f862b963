/// # Dock Booking Errors
/// This module defines the `DockBookingError` enum, which encapsulates all potential errors that can occur while talking to the booking backend.
/// The variants follow the failure taxonomy of the booking core (rejected input, transport, upstream status, malformed payloads, session faults)
/// and add the stage faults of the appointment booking sequence, which wrap the fault that ended the sequence.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DockBookingError {
    /// The requested date is not exactly eight ASCII digits (DDMMYYYY).
    #[error("Invalid date '{0}': expected DDMMYYYY")]
    InvalidDate(String),

    /// Caller supplied arguments were rejected before any network call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// DNS, timeout, connection reset and similar failures below HTTP.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success HTTP status.
    #[error("Upstream returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    /// The payload did not have the expected XML or JSON shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The token issuance response carried no `x-csrf-token` header.
    #[error("Backend did not issue a CSRF token")]
    NoToken,

    /// A required session cookie was absent from the `set-cookie` header.
    #[error("Missing session cookie: {0}")]
    MissingSessionCookie(String),

    #[error("Session unavailable: {0}")]
    SessionUnavailable(#[source] Box<DockBookingError>),

    #[error("Appointment creation failed: {0}")]
    CreationFailed(#[source] Box<DockBookingError>),

    /// The creation POST succeeded but its response carried no usable appointment key.
    /// The appointment may exist on the backend.
    #[error("Malformed creation response: {0}")]
    MalformedResponse(String),

    /// The appointment was created but its document number could not be read back.
    /// The appointment key is kept so the booking can be reconciled by hand.
    #[error("Document number resolution failed for appointment {appointment_key}: {source}")]
    ResolutionFailed {
        appointment_key: String,
        #[source]
        source: Box<DockBookingError>,
    },

    /// Represents errors arising from misconfigurations or invalid settings.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Represents standard input/output errors.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// Represents errors that occur during serialization or deserialization of data.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Coarse category of a [`DockBookingError`], reported to callers so that
/// "input rejected", "upstream unavailable" and "response malformed" stay distinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum ErrorKind {
    #[display("invalid_input")]
    InvalidInput,
    #[display("transport")]
    Transport,
    #[display("upstream")]
    Upstream,
    #[display("parse")]
    Parse,
    #[display("session")]
    Session,
    #[display("booking")]
    Booking,
    #[display("internal")]
    Internal,
}

impl ErrorKind {
    /// Whether the caller's input was at fault
    pub fn is_caller_fault(&self) -> bool {
        matches!(self, ErrorKind::InvalidInput)
    }
}

impl DockBookingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DockBookingError::InvalidDate(_) | DockBookingError::InvalidInput(_) => ErrorKind::InvalidInput,
            DockBookingError::Transport(_) => ErrorKind::Transport,
            DockBookingError::Upstream { .. } => ErrorKind::Upstream,
            DockBookingError::Parse(_) => ErrorKind::Parse,
            DockBookingError::NoToken | DockBookingError::MissingSessionCookie(_) => ErrorKind::Session,
            DockBookingError::SessionUnavailable(_)
            | DockBookingError::CreationFailed(_)
            | DockBookingError::MalformedResponse(_)
            | DockBookingError::ResolutionFailed { .. } => ErrorKind::Booking,
            DockBookingError::ConfigError(_)
            | DockBookingError::IoError(_)
            | DockBookingError::SerializationError(_) => ErrorKind::Internal,
        }
    }

    /// Whether repeating an idempotent read could succeed.
    /// Only transport faults and 5xx answers qualify.
    pub fn is_retryable(&self) -> bool {
        match self {
            DockBookingError::Transport(_) => true,
            DockBookingError::Upstream { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<config::ConfigError> for DockBookingError {
    fn from(err: config::ConfigError) -> Self {
        DockBookingError::ConfigError(err.to_string())
    }
}

impl From<reqwest::Error> for DockBookingError {
    fn from(err: reqwest::Error) -> Self {
        DockBookingError::Transport(err.to_string())
    }
}

impl From<quick_xml::Error> for DockBookingError {
    fn from(err: quick_xml::Error) -> Self {
        DockBookingError::Parse(err.to_string())
    }
}

pub type DockBookingResult<T> = Result<T, DockBookingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_faults_report_booking_kind() {
        let err = DockBookingError::CreationFailed(Box::new(DockBookingError::Upstream {
            status: 500,
            body: "boom".to_string(),
        }));
        assert_eq!(err.kind(), ErrorKind::Booking);
        assert_eq!(err.kind().to_string(), "booking");
        assert!(err.to_string().contains("HTTP 500"));
    }

    #[test]
    fn malformed_creation_response_is_a_booking_fault() {
        let err = DockBookingError::MalformedResponse("property 'AppointmentKey' is missing".to_string());
        assert_eq!(err.kind(), ErrorKind::Booking);
        assert_eq!(DockBookingError::Parse("bad".to_string()).kind(), ErrorKind::Parse);
    }

    #[test]
    fn only_transport_and_server_errors_are_retryable() {
        assert!(DockBookingError::Transport("reset".into()).is_retryable());
        assert!(DockBookingError::Upstream { status: 503, body: String::new() }.is_retryable());
        assert!(!DockBookingError::Upstream { status: 403, body: String::new() }.is_retryable());
        assert!(!DockBookingError::NoToken.is_retryable());
    }
}
