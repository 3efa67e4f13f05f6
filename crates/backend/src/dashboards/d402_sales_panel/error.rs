use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors of the sales panel dashboard
#[derive(Debug, Error)]
pub enum DashboardError {
    /// State/product outside the catalog, or a malformed date range / period.
    /// Raised before anything is written, so the session is left untouched.
    #[error("Invalid filter value: {0}")]
    InvalidFilterValue(String),

    #[error("Data source unavailable: {0}")]
    DataSourceUnavailable(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),
}

impl DashboardError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidFilterValue(msg.into())
    }

    fn code(&self) -> &'static str {
        match self {
            Self::InvalidFilterValue(_) => "INVALID_FILTER_VALUE",
            Self::DataSourceUnavailable(_) => "DATA_SOURCE_UNAVAILABLE",
            Self::SessionNotFound(_) => "SESSION_NOT_FOUND",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidFilterValue(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::DataSourceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::SessionNotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl From<sea_orm::DbErr> for DashboardError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::DataSourceUnavailable(err.to_string())
    }
}

/// JSON body returned for failed requests
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code(),
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

pub type DashboardResult<T> = Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            DashboardError::invalid("XX").into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            DashboardError::DataSourceUnavailable("down".into())
                .into_response()
                .status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            DashboardError::SessionNotFound("abc".into())
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_error_body_is_json() {
        let response = DashboardError::invalid("unknown state 'ZZ'").into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["code"], "INVALID_FILTER_VALUE");
        assert_eq!(
            body["message"],
            "Invalid filter value: unknown state 'ZZ'"
        );
    }
}
