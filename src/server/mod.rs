//! # HTTP Server for Label Rendering and Printing
//!
//! Serves stored templates as PNG previews and print jobs.
//!
//! ```bash
//! rotulo serve --listen 0.0.0.0:8013
//! ```

mod handlers;
mod state;

pub use state::AppState;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::compose::Composer;
use crate::config::Config;
use crate::error::RotuloError;
use crate::font::FontStore;

/// Start the HTTP server.
pub async fn serve(config: Config) -> Result<(), RotuloError> {
    // Font discovery walks the filesystem and the composer owns a blocking
    // HTTP client, so state construction stays off the async executor.
    let startup_config = config.clone();
    let state = tokio::task::spawn_blocking(move || {
        let fonts = FontStore::discover(&startup_config.font_dirs);
        if fonts.is_empty() {
            eprintln!("[server] no fonts found in {:?}", startup_config.font_dirs);
        }
        Arc::new(AppState::new(startup_config, Composer::new(fonts)))
    })
    .await
    .map_err(|e| RotuloError::Http(format!("startup failed: {}", e)))?;

    let app = Router::new()
        .route("/api/templates", get(handlers::list_templates))
        .route("/api/template/:name", get(handlers::get_template))
        .route("/api/template/:name/preview", post(handlers::preview))
        .route("/api/template/:name/print", post(handlers::print))
        .route("/api/fonts", get(handlers::list_fonts))
        .route("/api/media", get(handlers::list_media))
        .route("/api/schema", get(handlers::schema))
        .with_state(state);

    println!("rotulo label server starting...");
    println!("Listening on: {}", config.listen_addr);
    println!("Templates: {}", config.template_dir.display());
    println!("Spool: {}", config.spool_dir.display());

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| {
            RotuloError::Http(format!("failed to bind to {}: {}", config.listen_addr, e))
        })?;

    axum::serve(listener, app)
        .await
        .map_err(|e| RotuloError::Http(format!("server error: {}", e)))?;

    Ok(())
}
