use axum::Router;
use meti::Rag;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{axum::state, http::routes};

pub fn create(rag: Rag) -> Router {
    Router::new()
        .merge(routes::mount())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state::create(rag))
}
