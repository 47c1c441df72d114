//! Error types for the SLP client
//!
//! Directory agents report failures as signed status codes. Every code is
//! translated into exactly one [`ErrorKind`] at the point of call; the raw
//! code travels along inside [`SlpError`] as context.

use thiserror::Error;

/// Result type alias for SLP operations
pub type Result<T> = std::result::Result<T, SlpError>;

/// Boxed error produced by a caller-supplied handler
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Status code reported by a directory agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(pub i32);

impl Status {
    pub const LAST_CALL: Status = Status(1);
    pub const OK: Status = Status(0);
    pub const LANGUAGE_NOT_SUPPORTED: Status = Status(-1);
    pub const PARSE_ERROR: Status = Status(-2);
    pub const INVALID_REGISTRATION: Status = Status(-3);
    pub const SCOPE_NOT_SUPPORTED: Status = Status(-4);
    pub const AUTHENTICATION_ABSENT: Status = Status(-6);
    pub const AUTHENTICATION_FAILED: Status = Status(-7);
    pub const INVALID_UPDATE: Status = Status(-13);
    pub const REFRESH_REJECTED: Status = Status(-15);
    pub const NOT_IMPLEMENTED: Status = Status(-17);
    pub const BUFFER_OVERFLOW: Status = Status(-18);
    pub const NETWORK_TIMED_OUT: Status = Status(-19);
    pub const NETWORK_INIT_FAILED: Status = Status(-20);
    pub const MEMORY_ALLOC_FAILED: Status = Status(-21);
    pub const PARAMETER_BAD: Status = Status(-22);
    pub const NETWORK_ERROR: Status = Status(-23);
    pub const INTERNAL_SYSTEM_ERROR: Status = Status(-24);
    pub const HANDLE_IN_USE: Status = Status(-25);
    pub const TYPE_ERROR: Status = Status(-26);

    /// Raw numeric code
    pub fn code(self) -> i32 {
        self.0
    }

    /// `OK` and `LAST_CALL` are the only non-failure codes
    pub fn is_success(self) -> bool {
        self.0 >= 0
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed set of failure kinds surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    LanguageNotSupported,
    ParseError,
    InvalidRegistration,
    ScopeNotSupported,
    AuthenticationAbsent,
    AuthenticationFailed,
    InvalidUpdate,
    RefreshRejected,
    NotImplemented,
    BufferOverflow,
    NetworkTimedOut,
    NetworkInitFailed,
    MemoryAllocFailed,
    ParameterBad,
    NetworkError,
    InternalSystemError,
    HandleInUse,
    TypeError,
    /// Operation attempted on a closed session (client-side, no protocol code)
    SessionClosed,
    /// A per-item handler failed and aborted an enumeration (client-side)
    HandlerFailed,
}

impl ErrorKind {
    /// Map a failure status to its kind.
    ///
    /// Returns `None` for success codes. Unknown negative codes fall into
    /// `InternalSystemError`.
    pub fn from_status(status: Status) -> Option<Self> {
        let kind = match status.0 {
            code if code >= 0 => return None,
            -1 => ErrorKind::LanguageNotSupported,
            -2 => ErrorKind::ParseError,
            -3 => ErrorKind::InvalidRegistration,
            -4 => ErrorKind::ScopeNotSupported,
            -6 => ErrorKind::AuthenticationAbsent,
            -7 => ErrorKind::AuthenticationFailed,
            -13 => ErrorKind::InvalidUpdate,
            -15 => ErrorKind::RefreshRejected,
            -17 => ErrorKind::NotImplemented,
            -18 => ErrorKind::BufferOverflow,
            -19 => ErrorKind::NetworkTimedOut,
            -20 => ErrorKind::NetworkInitFailed,
            -21 => ErrorKind::MemoryAllocFailed,
            -22 => ErrorKind::ParameterBad,
            -23 => ErrorKind::NetworkError,
            -25 => ErrorKind::HandleInUse,
            -26 => ErrorKind::TypeError,
            _ => ErrorKind::InternalSystemError,
        };
        Some(kind)
    }

    /// Protocol status code for this kind, if it has one
    pub fn status(self) -> Option<Status> {
        let status = match self {
            ErrorKind::LanguageNotSupported => Status::LANGUAGE_NOT_SUPPORTED,
            ErrorKind::ParseError => Status::PARSE_ERROR,
            ErrorKind::InvalidRegistration => Status::INVALID_REGISTRATION,
            ErrorKind::ScopeNotSupported => Status::SCOPE_NOT_SUPPORTED,
            ErrorKind::AuthenticationAbsent => Status::AUTHENTICATION_ABSENT,
            ErrorKind::AuthenticationFailed => Status::AUTHENTICATION_FAILED,
            ErrorKind::InvalidUpdate => Status::INVALID_UPDATE,
            ErrorKind::RefreshRejected => Status::REFRESH_REJECTED,
            ErrorKind::NotImplemented => Status::NOT_IMPLEMENTED,
            ErrorKind::BufferOverflow => Status::BUFFER_OVERFLOW,
            ErrorKind::NetworkTimedOut => Status::NETWORK_TIMED_OUT,
            ErrorKind::NetworkInitFailed => Status::NETWORK_INIT_FAILED,
            ErrorKind::MemoryAllocFailed => Status::MEMORY_ALLOC_FAILED,
            ErrorKind::ParameterBad => Status::PARAMETER_BAD,
            ErrorKind::NetworkError => Status::NETWORK_ERROR,
            ErrorKind::InternalSystemError => Status::INTERNAL_SYSTEM_ERROR,
            ErrorKind::HandleInUse => Status::HANDLE_IN_USE,
            ErrorKind::TypeError => Status::TYPE_ERROR,
            ErrorKind::SessionClosed | ErrorKind::HandlerFailed => return None,
        };
        Some(status)
    }

    fn describe(self) -> &'static str {
        match self {
            ErrorKind::LanguageNotSupported => "language not supported",
            ErrorKind::ParseError => "parse error",
            ErrorKind::InvalidRegistration => "invalid registration",
            ErrorKind::ScopeNotSupported => "scope not supported",
            ErrorKind::AuthenticationAbsent => "authentication absent",
            ErrorKind::AuthenticationFailed => "authentication failed",
            ErrorKind::InvalidUpdate => "invalid update",
            ErrorKind::RefreshRejected => "refresh rejected",
            ErrorKind::NotImplemented => "not implemented",
            ErrorKind::BufferOverflow => "buffer overflow",
            ErrorKind::NetworkTimedOut => "network timed out",
            ErrorKind::NetworkInitFailed => "network initialization failed",
            ErrorKind::MemoryAllocFailed => "memory allocation failed",
            ErrorKind::ParameterBad => "bad parameter",
            ErrorKind::NetworkError => "network error",
            ErrorKind::InternalSystemError => "internal system error",
            ErrorKind::HandleInUse => "handle in use",
            ErrorKind::TypeError => "type error",
            ErrorKind::SessionClosed => "session closed",
            ErrorKind::HandlerFailed => "handler failed",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.describe())
    }
}

/// Error raised by every failing SLP operation
#[derive(Error, Debug)]
#[error("{operation}: {kind}: {message}")]
pub struct SlpError {
    kind: ErrorKind,
    code: Option<i32>,
    operation: &'static str,
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl SlpError {
    /// Create an error with no protocol status attached
    pub fn new(kind: ErrorKind, operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            operation,
            message: message.into(),
            source: None,
        }
    }

    /// Translate a failure status reported by a directory agent
    pub fn from_status(operation: &'static str, status: Status) -> Self {
        let kind = ErrorKind::from_status(status).unwrap_or(ErrorKind::InternalSystemError);
        Self {
            kind,
            code: Some(status.code()),
            operation,
            message: format!("directory agent returned status {}", status),
            source: None,
        }
    }

    pub fn parse(operation: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseError, operation, message)
    }

    pub fn parameter(operation: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParameterBad, operation, message)
    }

    pub fn closed(operation: &'static str) -> Self {
        Self::new(ErrorKind::SessionClosed, operation, "session is closed")
    }

    pub fn in_use(operation: &'static str) -> Self {
        Self {
            code: Some(Status::HANDLE_IN_USE.code()),
            ..Self::new(
                ErrorKind::HandleInUse,
                operation,
                "session is busy with another operation",
            )
        }
    }

    /// Wrap the failure of a per-item handler
    pub fn handler(operation: &'static str, source: BoxError) -> Self {
        Self {
            message: format!("handler aborted enumeration: {}", source),
            source: Some(source),
            ..Self::new(ErrorKind::HandlerFailed, operation, "")
        }
    }

    /// Failure kind, for matching without parsing the message
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Raw status code reported by the directory agent, if any
    pub fn code(&self) -> Option<i32> {
        self.code
    }

    /// Name of the operation that failed
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Rebind the error to an outer operation, keeping everything else
    pub fn in_operation(mut self, operation: &'static str) -> Self {
        self.operation = operation;
        self
    }
}

/// Map a collaborator result into the taxonomy
pub trait StatusExt<T> {
    fn or_slp(self, operation: &'static str) -> Result<T>;
}

impl<T> StatusExt<T> for std::result::Result<T, Status> {
    fn or_slp(self, operation: &'static str) -> Result<T> {
        self.map_err(|status| SlpError::from_status(operation, status))
    }
}
