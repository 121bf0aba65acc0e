use axum::{
    routing::{get, post},
    Router,
};

use crate::{axum::state::AppState, http::controllers::QueryController};

pub fn mount() -> Router<AppState> {
    Router::new()
        .route("/query", post(QueryController::ask))
        .route("/committees", get(QueryController::committees))
}
