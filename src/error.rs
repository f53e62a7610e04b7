// Domain error taxonomy shared by every controller and rendered by the router
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

/// Closed set of domain error kinds. The numeric values are part of the wire
/// contract: clients branch on `code`, never on `message`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
#[repr(u32)]
pub enum ErrCode {
    InternalErr = 0,
    InvalidArgument = 1,
    NotFound = 2,
    AlreadyExistsErr = 3,
    PermissionDenied = 4,
    Unauthenticated = 5,
    PaymentRequired = 6,
    Gone = 7,
}

impl ErrCode {
    pub const ALL: [ErrCode; 8] = [
        ErrCode::InternalErr,
        ErrCode::InvalidArgument,
        ErrCode::NotFound,
        ErrCode::AlreadyExistsErr,
        ErrCode::PermissionDenied,
        ErrCode::Unauthenticated,
        ErrCode::PaymentRequired,
        ErrCode::Gone,
    ];

    /// HTTP status for this code.
    ///
    /// PermissionDenied deliberately renders as 404 so that a caller without
    /// access cannot distinguish "exists but hidden" from "does not exist".
    pub fn http_status(self) -> StatusCode {
        match self {
            ErrCode::InternalErr => StatusCode::INTERNAL_SERVER_ERROR,
            ErrCode::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrCode::NotFound => StatusCode::NOT_FOUND,
            ErrCode::AlreadyExistsErr => StatusCode::CONFLICT,
            ErrCode::PermissionDenied => StatusCode::NOT_FOUND,
            ErrCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrCode::PaymentRequired => StatusCode::PAYMENT_REQUIRED,
            ErrCode::Gone => StatusCode::GONE,
        }
    }

    /// Message used when a caller does not supply one
    pub fn default_message(self) -> &'static str {
        match self {
            ErrCode::InternalErr => "internal error",
            ErrCode::InvalidArgument => "invalid argument(s) received",
            ErrCode::NotFound => "not found",
            ErrCode::AlreadyExistsErr => "resource already exists",
            ErrCode::PermissionDenied => "unauthorized to perform action",
            ErrCode::Unauthenticated => "unauthenticated",
            ErrCode::PaymentRequired => "license required",
            ErrCode::Gone => "resource is gone",
        }
    }
}

impl From<ErrCode> for u32 {
    fn from(code: ErrCode) -> Self {
        code as u32
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown error code {0}")]
pub struct UnknownErrCode(pub u32);

impl TryFrom<u32> for ErrCode {
    type Error = UnknownErrCode;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        ErrCode::ALL
            .iter()
            .copied()
            .find(|code| *code as u32 == value)
            .ok_or(UnknownErrCode(value))
    }
}

/// HTTP status for a raw numeric code, e.g. one relayed from another service.
/// Unknown codes are a programming error upstream; they are logged and become 500.
pub fn status_for_raw_code(code: u32) -> StatusCode {
    match ErrCode::try_from(code) {
        Ok(code) => code.http_status(),
        Err(e) => {
            tracing::error!(code, "no status mapping for error code: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Tagged error carried from the controllers to the transport boundary.
#[derive(Debug)]
pub struct Error {
    pub code: ErrCode,
    pub message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl Error {
    /// Wrap a lower-level failure; its text becomes the message.
    pub fn new<E>(code: ErrCode, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            code,
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// Build an error with an explicit message and no wrapped cause.
    pub fn with_message(code: ErrCode, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            code,
            message: if message.is_empty() {
                code.default_message().to_string()
            } else {
                message
            },
            source: None,
        }
    }

    /// Build an error carrying the code's default message.
    pub fn from_code(code: ErrCode) -> Self {
        Self::with_message(code, code.default_message())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_message(ErrCode::InternalErr, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::with_message(ErrCode::InvalidArgument, message)
    }

    pub fn not_found() -> Self {
        Self::from_code(ErrCode::NotFound)
    }

    pub fn already_exists() -> Self {
        Self::from_code(ErrCode::AlreadyExistsErr)
    }

    pub fn permission_denied() -> Self {
        Self::from_code(ErrCode::PermissionDenied)
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::with_message(ErrCode::Unauthenticated, message)
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.http_status()
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "message": self.message,
            "code": u32::from(self.code),
        })
    }

    /// Best-effort downcast of an arbitrary error to a tagged one.
    pub fn from_any(err: &anyhow::Error) -> Option<&Error> {
        err.downcast_ref::<Error>()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// Store failures are re-tagged here and nowhere else
impl From<crate::store::StoreError> for Error {
    fn from(err: crate::store::StoreError) -> Self {
        use crate::store::StoreError;
        match err {
            StoreError::NotFound(_) => Error::not_found(),
            StoreError::AlreadyExists(_) => Error::already_exists(),
            StoreError::NotValid(msg) => Error::invalid_argument(msg),
            other => {
                tracing::error!("store error: {}", other);
                Error {
                    code: ErrCode::InternalErr,
                    message: ErrCode::InternalErr.default_message().to_string(),
                    source: Some(Box::new(other)),
                }
            }
        }
    }
}

impl From<crate::types::ValidationError> for Error {
    fn from(err: crate::types::ValidationError) -> Self {
        Error::new(ErrCode::InvalidArgument, err)
    }
}

impl From<crate::pager::PagerError> for Error {
    fn from(err: crate::pager::PagerError) -> Self {
        Error::new(ErrCode::InvalidArgument, err)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
