//! Error handling for storefront API operations.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::session::SessionError;

/// Common error type for storefront API operations.
///
/// The gateway resolves recoverable authorization expiry internally
/// (refresh-and-retry); every kind that reaches a caller is terminal for
/// that request. Callers never see raw transport responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The access token expired and could not be recovered by the single
    /// refresh-and-retry. The session has been cleared; sign in again.
    #[error("authentication expired, sign in again")]
    AuthExpired,
    /// The token was rejected outright (revoked or malformed).
    /// The session has been cleared.
    #[error("authentication rejected, sign in again")]
    AuthInvalid,
    /// The backend reported that the requested quantity is not available.
    #[error("insufficient stock{}", fmt_detail(.detail))]
    InsufficientStock { detail: Option<String> },
    /// Any other non-2xx response, with a best-effort detail message
    /// parsed from the body.
    #[error("{status}: {detail}")]
    Response { status: StatusCode, detail: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error(transparent)]
    State(#[from] SessionError),
    #[error("{0}")]
    Other(String),
}

fn fmt_detail(detail: &Option<String>) -> String {
    match detail {
        Some(detail) => format!(": {detail}"),
        None => String::new(),
    }
}

/// Error body shape used by the backend. Older endpoints use `message`,
/// newer ones `detail`; both are tolerated.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
    message: Option<String>,
}

/// Turns a non-2xx response into an [ApiError::Response], consuming the
/// body for its detail message if it parses.
pub(crate) async fn response_error(response: reqwest::Response) -> ApiError {
    let status = response.status();
    let detail = match response.json::<ErrorBody>().await {
        Ok(body) => body
            .detail
            .or(body.message)
            .unwrap_or_else(|| status_fallback(status)),
        // The body may be HTML garbage from a proxy; don't surface it.
        Err(_) => status_fallback(status),
    };
    ApiError::Response { status, detail }
}

fn status_fallback(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("unexpected response")
        .to_string()
}

/// Extension trait mapping conflict responses on cart and order endpoints
/// into [ApiError::InsufficientStock].
///
/// The backend signals a stock conflict as 409 (and historically 422);
/// 422 on any other endpoint stays a generic response error, so this is
/// applied per call site rather than in the gateway.
pub(crate) trait MapStockConflictExt<T> {
    fn map_stock_conflict(self) -> Result<T, ApiError>;
}

impl<T> MapStockConflictExt<T> for Result<T, ApiError> {
    fn map_stock_conflict(self) -> Result<T, ApiError> {
        match self {
            Err(ApiError::Response { status, detail })
                if status == StatusCode::CONFLICT
                    || status == StatusCode::UNPROCESSABLE_ENTITY =>
            {
                Err(ApiError::InsufficientStock {
                    detail: Some(detail),
                })
            },
            other => other,
        }
    }
}

impl ApiError {
    /// True for the kinds that force the user back to sign-in.
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::AuthExpired | ApiError::AuthInvalid)
    }

    pub fn is_stock_conflict(&self) -> bool {
        matches!(self, ApiError::InsufficientStock { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_maps_to_insufficient_stock() {
        let res: Result<(), ApiError> = Err(ApiError::Response {
            status: StatusCode::CONFLICT,
            detail: "only 3 left".to_string(),
        });
        let err = res.map_stock_conflict().unwrap_err();
        assert!(err.is_stock_conflict());
        assert_eq!(err.to_string(), "insufficient stock: only 3 left");
    }

    #[test]
    fn unprocessable_maps_to_insufficient_stock() {
        let res: Result<(), ApiError> = Err(ApiError::Response {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            detail: "insufficient stock".to_string(),
        });
        assert!(res.map_stock_conflict().unwrap_err().is_stock_conflict());
    }

    #[test]
    fn other_statuses_pass_through() {
        let res: Result<(), ApiError> = Err(ApiError::Response {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: "boom".to_string(),
        });
        let err = res.map_stock_conflict().unwrap_err();
        assert!(matches!(err, ApiError::Response { .. }));
    }
}
