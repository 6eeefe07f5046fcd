use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Wire codes emitted by the mofumofu API in the `code` field of error bodies.
pub mod codes {
    /// `user:invalid_password`
    pub const USER_INVALID_PASSWORD: &str = "user:invalid_password";
    /// `user:not_found`
    pub const USER_NOT_FOUND: &str = "user:not_found";
    /// `user:unauthorized`
    pub const USER_UNAUTHORIZED: &str = "user:unauthorized";
    /// `user:token_expired`
    pub const USER_TOKEN_EXPIRED: &str = "user:token_expired";
    /// `user:invalid_token`
    pub const USER_INVALID_TOKEN: &str = "user:invalid_token";
    /// `user:no_refresh_token`
    pub const USER_NO_REFRESH_TOKEN: &str = "user:no_refresh_token";

    /// `follow:cannot_follow_self`
    pub const FOLLOW_CANNOT_FOLLOW_SELF: &str = "follow:cannot_follow_self";
    /// `follow:already_following`
    pub const FOLLOW_ALREADY_FOLLOWING: &str = "follow:already_following";
    /// `follow:not_exist`
    pub const FOLLOW_NOT_EXIST: &str = "follow:not_exist";

    /// `general:bad_request`
    pub const BAD_REQUEST: &str = "general:bad_request";
    /// `general:validation_error`
    pub const VALIDATION_ERROR: &str = "general:validation_error";

    /// `system:hashing_error`
    pub const SYS_HASHING_ERROR: &str = "system:hashing_error";
    /// `system:not_found`
    pub const SYS_NOT_FOUND: &str = "system:not_found";
    /// `system:transaction_error`
    pub const SYS_TRANSACTION_ERROR: &str = "system:transaction_error";
    /// `system:database_error`
    pub const SYS_DATABASE_ERROR: &str = "system:database_error";
    /// `system:token_creation_error`
    pub const SYS_TOKEN_CREATION_ERROR: &str = "system:token_creation_error";

    /// Used when an error response carries no code at all.
    pub const UNKNOWN_ERROR: &str = "unknown_error";
}

/// Errors that can occur when using the mofumofu client
#[derive(Debug, Error)]
pub enum MofuError {
    /// Transport failure (timeout, connection reset, TLS, ...)
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Classified error returned by the API
    #[error("API error: {0}")]
    Api(ApiError),

    /// Configuration error (e.g., invalid header value or base URL)
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(String),

    /// Credential persistence error
    #[error("Credential storage error: {0}")]
    Storage(String),
}

impl MofuError {
    /// Determines if this error is retryable at the transport layer
    ///
    /// Retryable errors are timeouts, connection failures, and API errors whose
    /// status is in the transient set (see [`crate::retry::is_retryable_status`]).
    /// Auth failures are never retried here; they belong to the refresh logic.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api(err) => {
                !err.kind().is_auth_failure() && crate::retry::is_retryable_status(err.status())
            }
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Config(_) | Self::Serde(_) | Self::Storage(_) => false,
        }
    }

    /// Returns the classified kind when this is an API error
    #[must_use]
    pub fn api_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Api(err) => Some(err.kind()),
            _ => None,
        }
    }
}

/// Closed set of server error kinds understood by the client.
///
/// Anything the server sends that is not listed here becomes [`ErrorKind::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// `user:invalid_password`
    UserInvalidPassword,
    /// `user:not_found`
    UserNotFound,
    /// `user:unauthorized`
    UserUnauthorized,
    /// `user:token_expired`
    UserTokenExpired,
    /// `user:invalid_token`
    UserInvalidToken,
    /// `user:no_refresh_token`
    UserNoRefreshToken,
    /// `follow:cannot_follow_self`
    FollowCannotFollowSelf,
    /// `follow:already_following`
    FollowAlreadyFollowing,
    /// `follow:not_exist`
    FollowNotExist,
    /// `general:bad_request`
    BadRequest,
    /// `general:validation_error`
    ValidationError,
    /// `system:hashing_error`
    SysHashingError,
    /// `system:not_found`
    SysNotFound,
    /// `system:transaction_error`
    SysTransactionError,
    /// `system:database_error`
    SysDatabaseError,
    /// `system:token_creation_error`
    SysTokenCreationError,
    /// Any code this client does not recognize
    Unknown,
}

impl ErrorKind {
    /// Every recognized kind (excludes [`ErrorKind::Unknown`])
    pub const KNOWN: [Self; 16] = [
        Self::UserInvalidPassword,
        Self::UserNotFound,
        Self::UserUnauthorized,
        Self::UserTokenExpired,
        Self::UserInvalidToken,
        Self::UserNoRefreshToken,
        Self::FollowCannotFollowSelf,
        Self::FollowAlreadyFollowing,
        Self::FollowNotExist,
        Self::BadRequest,
        Self::ValidationError,
        Self::SysHashingError,
        Self::SysNotFound,
        Self::SysTransactionError,
        Self::SysDatabaseError,
        Self::SysTokenCreationError,
    ];

    /// Maps a wire code to its kind
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            codes::USER_INVALID_PASSWORD => Self::UserInvalidPassword,
            codes::USER_NOT_FOUND => Self::UserNotFound,
            codes::USER_UNAUTHORIZED => Self::UserUnauthorized,
            codes::USER_TOKEN_EXPIRED => Self::UserTokenExpired,
            codes::USER_INVALID_TOKEN => Self::UserInvalidToken,
            codes::USER_NO_REFRESH_TOKEN => Self::UserNoRefreshToken,
            codes::FOLLOW_CANNOT_FOLLOW_SELF => Self::FollowCannotFollowSelf,
            codes::FOLLOW_ALREADY_FOLLOWING => Self::FollowAlreadyFollowing,
            codes::FOLLOW_NOT_EXIST => Self::FollowNotExist,
            codes::BAD_REQUEST => Self::BadRequest,
            codes::VALIDATION_ERROR => Self::ValidationError,
            codes::SYS_HASHING_ERROR => Self::SysHashingError,
            codes::SYS_NOT_FOUND => Self::SysNotFound,
            codes::SYS_TRANSACTION_ERROR => Self::SysTransactionError,
            codes::SYS_DATABASE_ERROR => Self::SysDatabaseError,
            codes::SYS_TOKEN_CREATION_ERROR => Self::SysTokenCreationError,
            _ => Self::Unknown,
        }
    }

    /// Returns the canonical wire code for this kind
    ///
    /// [`ErrorKind::Unknown`] maps to `unknown_error`; the raw server code is kept on
    /// [`ApiError::code`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UserInvalidPassword => codes::USER_INVALID_PASSWORD,
            Self::UserNotFound => codes::USER_NOT_FOUND,
            Self::UserUnauthorized => codes::USER_UNAUTHORIZED,
            Self::UserTokenExpired => codes::USER_TOKEN_EXPIRED,
            Self::UserInvalidToken => codes::USER_INVALID_TOKEN,
            Self::UserNoRefreshToken => codes::USER_NO_REFRESH_TOKEN,
            Self::FollowCannotFollowSelf => codes::FOLLOW_CANNOT_FOLLOW_SELF,
            Self::FollowAlreadyFollowing => codes::FOLLOW_ALREADY_FOLLOWING,
            Self::FollowNotExist => codes::FOLLOW_NOT_EXIST,
            Self::BadRequest => codes::BAD_REQUEST,
            Self::ValidationError => codes::VALIDATION_ERROR,
            Self::SysHashingError => codes::SYS_HASHING_ERROR,
            Self::SysNotFound => codes::SYS_NOT_FOUND,
            Self::SysTransactionError => codes::SYS_TRANSACTION_ERROR,
            Self::SysDatabaseError => codes::SYS_DATABASE_ERROR,
            Self::SysTokenCreationError => codes::SYS_TOKEN_CREATION_ERROR,
            Self::Unknown => codes::UNKNOWN_ERROR,
        }
    }

    /// Stale credential that a refresh may restore
    #[must_use]
    pub const fn is_recoverable(self) -> bool {
        matches!(self, Self::UserTokenExpired | Self::UserUnauthorized)
    }

    /// No refresh is possible; the session must end now
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::UserNoRefreshToken)
    }

    const fn is_auth_failure(self) -> bool {
        self.is_recoverable() || self.is_terminal()
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server error envelope: `{ code, status, ...extra }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code
    pub code: String,
    /// HTTP status reported by the server
    pub status: u16,
    /// Any additional fields, passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A classified API failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    kind: ErrorKind,
    code: String,
    status: u16,
    body: Option<ErrorBody>,
}

impl ApiError {
    /// Classified kind, for exhaustive matching
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Raw code as sent by the server
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// HTTP status
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Parsed error body, if the server sent a usable one
    #[must_use]
    pub const fn body(&self) -> Option<&ErrorBody> {
        self.body.as_ref()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (status {})", self.code, self.status)
    }
}

/// Resolves a code, status and optional body into exactly one [`ApiError`].
///
/// Total over all inputs: unrecognized codes become [`ErrorKind::Unknown`] with the
/// raw code and status preserved.
#[must_use]
pub fn classify(code: &str, status: u16, body: Option<ErrorBody>) -> ApiError {
    ApiError {
        kind: ErrorKind::from_code(code),
        code: code.to_owned(),
        status,
        body,
    }
}

/// Maps a serde deserialization error to a `MofuError` with context
#[must_use]
pub fn map_deser(e: &serde_json::Error, body: &[u8]) -> MofuError {
    let snippet = String::from_utf8_lossy(&body[..body.len().min(400)]).to_string();
    MofuError::Serde(format!("{e}: {snippet}"))
}

/// Builds the classified error for a non-success response
///
/// Body parsing is best-effort: an unparseable body is logged and the error falls
/// back to `unknown_error` with the HTTP status and no body.
#[must_use]
pub fn deserialize_api_error(status: StatusCode, body: &[u8]) -> MofuError {
    MofuError::Api(parse_error_response(status.as_u16(), body))
}

fn parse_error_response(http_status: u16, body: &[u8]) -> ApiError {
    let mut map = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return classify(codes::UNKNOWN_ERROR, http_status, None),
        Err(e) => {
            tracing::warn!(status = http_status, error = %e, "Failed to parse error response");
            return classify(codes::UNKNOWN_ERROR, http_status, None);
        }
    };

    let code = match map.remove("code") {
        Some(Value::String(code)) if !code.is_empty() => code,
        _ => return classify(codes::UNKNOWN_ERROR, http_status, None),
    };
    let status = map
        .remove("status")
        .and_then(|v| v.as_u64())
        .and_then(|v| u16::try_from(v).ok())
        .unwrap_or(http_status);

    let body = ErrorBody {
        code: code.clone(),
        status,
        extra: map,
    };
    classify(&code, status, Some(body))
}
