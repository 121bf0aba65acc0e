use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    ClientError(String),

    #[error("Query failed. Please try again.")]
    UpstreamError(#[source] meti::Error),

    #[error("Internal server error.")]
    ServerError(#[source] meti::Error),
}

impl ApiError {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::ClientError(_) => StatusCode::BAD_REQUEST,
            Self::UpstreamError(_) => StatusCode::BAD_GATEWAY,
            Self::ServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<meti::Error> for ApiError {
    fn from(err: meti::Error) -> Self {
        match err {
            meti::Error::InvalidQuery(message) => Self::ClientError(message),
            meti::Error::Retrieval(_) | meti::Error::Generation(_) => Self::UpstreamError(err),
            meti::Error::Configuration(_) => Self::ServerError(err),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::ClientError(rejection.body_text())
    }
}

#[derive(Debug, serde::Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::UpstreamError(source) | Self::ServerError(source) => error!("{source}"),
            Self::ClientError(_) => {}
        }

        (
            self.status_code(),
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

impl PartialEq for ApiError {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string() && self.status_code() == other.status_code()
    }
}
