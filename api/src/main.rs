#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use ::axum::Server;
use dotenvy::dotenv;
use std::{env, net::SocketAddr, process};
use tracing::{error, info};

use crate::{axum::app, utils::logger};
use ::meti::{Config, Rag};

mod axum;
mod http;
mod utils;

#[tokio::main]
async fn main() {
    dotenv().ok();
    let _guard = logger::setup();

    let rag = match Config::from_env() {
        Ok(config) => Rag::from_config(&config).await,
        Err(e) => Err(e),
    };

    let rag = match rag {
        Ok(rag) => rag,
        Err(e) => {
            error!("Failed to initialize the RAG system: {e}");
            process::exit(1);
        }
    };

    let address = SocketAddr::from((
        [0, 0, 0, 0],
        env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8000),
    ));

    info!("⚡ METI API started on http://{address}");
    Server::bind(&address)
        .serve(app::create(rag).into_make_service())
        .await
        .expect("Failed to start server");
}
