use axum::{routing::get, Router};

mod query;

use crate::{axum::state::AppState, http::controllers::StatusController};

pub fn mount() -> Router<AppState> {
    Router::new()
        .merge(query::mount())
        .route("/version", get(StatusController::version))
        .route("/", get(StatusController::health))
}
