// Web server for the query API

use http::{header, Method};
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::WebConfig;
use crate::utils::logging;

use super::routes::{create_router, AppState};

/// Start the web server and serve until it fails
pub async fn start_server(config: &WebConfig, state: AppState) -> std::io::Result<()> {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_origin(Any);

    let app = create_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.api_port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    logging::log_info(&format!(
        "🌐 Query API listening on http://localhost:{}",
        config.api_port
    ));
    axum::serve(listener, app).await
}
