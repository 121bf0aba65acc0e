use axum::Json;
use serde_json::{json, Value};

#[derive(serde::Serialize)]
pub struct MetiVersion {
    semver: &'static str,
    compile_time: &'static str,
}

#[allow(clippy::unused_async)]
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[allow(clippy::unused_async)]
pub async fn version() -> Json<MetiVersion> {
    Json(MetiVersion {
        semver: env!("CARGO_PKG_VERSION"),
        compile_time: env!("STATIC_BUILD_DATE"),
    })
}
