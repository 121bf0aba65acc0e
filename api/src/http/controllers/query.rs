use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use meti::{
    catalog::{Committee, COMMITTEES},
    PromptKind, QueryResult, DEFAULT_K, MAX_K, MIN_K,
};

use crate::axum::{
    errors::{ApiError, ApiResult},
    state::AppState,
};

/// Loosely typed so that bad values reach the query validation and come back as 400s.
#[derive(Debug, serde::Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    question: String,
    prompt_type: Option<String>,
    k: Option<i64>,
}

impl QueryRequest {
    fn prompt_kind(&self) -> ApiResult<PromptKind> {
        Ok(self
            .prompt_type
            .as_deref()
            .map(str::parse::<PromptKind>)
            .transpose()?
            .unwrap_or_default())
    }

    fn k(&self) -> ApiResult<usize> {
        self.k.map_or(Ok(DEFAULT_K), |k| {
            usize::try_from(k).map_err(|_| {
                ApiError::ClientError(format!(
                    "The number of documents to retrieve must be between {MIN_K} and {MAX_K}, got {k}."
                ))
            })
        })
    }
}

pub async fn ask(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> ApiResult<Json<QueryResult>> {
    let Json(request) = payload?;

    let result = state
        .rag
        .ask(&request.question, request.prompt_kind()?, request.k()?)
        .await?;

    Ok(Json(result))
}

#[allow(clippy::unused_async)]
pub async fn committees() -> Json<&'static [Committee]> {
    Json(&COMMITTEES)
}
