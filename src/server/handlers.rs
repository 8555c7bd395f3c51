//! HTTP handlers: template discovery, preview, print.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::context::LabelContext;
use crate::error::RotuloError;
use crate::media;
use crate::template::Payload;

use super::state::AppState;

/// Map an engine error onto an HTTP reply. Lookup, encoder and template
/// problems are the caller's fault; everything else is ours.
fn error_response(e: RotuloError) -> (StatusCode, String) {
    let status = match e {
        RotuloError::Lookup(_) | RotuloError::Encoder(_) | RotuloError::Template(_) => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

/// Render one template to PNG bytes on a blocking worker. The walk is
/// synchronous (fonts, raster work, blocking HTTP), so it must not run on
/// the async executor.
async fn render_png(
    state: Arc<AppState>,
    name: String,
    params: HashMap<String, String>,
    mut payload: Payload,
) -> Result<Vec<u8>, (StatusCode, String)> {
    let result = tokio::task::spawn_blocking(move || {
        let template = state.load_template(&name)?;
        let ctx = LabelContext::from_params(&params, &state.config, state.composer.fonts())?;
        let canvas = state.composer.render_template(&template, &ctx, &mut payload)?;
        canvas.to_png()
    })
    .await;

    match result {
        Ok(Ok(png)) => Ok(png),
        Ok(Err(e)) => Err(error_response(e)),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("render task failed: {}", e),
        )),
    }
}

/// GET /api/templates
pub async fn list_templates(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({ "templates": state.list_templates() }))
}

/// GET /api/template/:name — the stored template, verbatim.
pub async fn get_template(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let path = state.template_path(&name).map_err(error_response)?;
    let body = std::fs::read_to_string(&path)
        .map_err(|e| error_response(RotuloError::Io(e)))?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}

/// POST /api/template/:name/preview — query params become the context,
/// the JSON body (if any) becomes the payload; replies with the PNG.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    payload: Option<Json<Payload>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let png = render_png(state, name, params, payload).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}

/// POST /api/template/:name/print — render, then hand the PNG to the
/// print backend.
pub async fn print(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    payload: Option<Json<Payload>>,
) -> Response {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let png = match render_png(state.clone(), name.clone(), params, payload).await {
        Ok(png) => png,
        Err((status, message)) => {
            return (status, Json(json!({ "success": false, "error": message })))
                .into_response();
        }
    };

    let submit = tokio::task::spawn_blocking(move || state.printer.submit(&name, &png)).await;
    match submit {
        Ok(Ok(job)) => (
            StatusCode::OK,
            Json(json!({ "success": true, "job": job })),
        )
            .into_response(),
        Ok(Err(e)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "error": format!("print failed: {}", e) })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "error": format!("task error: {}", e) })),
        )
            .into_response(),
    }
}

/// GET /api/fonts — discovered families and styles.
pub async fn list_fonts(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let fonts: Vec<_> = state
        .composer
        .fonts()
        .families()
        .into_iter()
        .map(|(family, styles)| json!({ "family": family, "styles": styles }))
        .collect();
    Json(json!({ "fonts": fonts }))
}

/// GET /api/media — supported label sizes.
pub async fn list_media() -> Json<serde_json::Value> {
    let sizes: Vec<_> = media::MEDIA
        .iter()
        .map(|m| {
            json!({
                "name": m.name,
                "width": m.dots.0,
                "height": m.dots.1,
                "two_color": m.two_color,
            })
        })
        .collect();
    Json(json!({ "media": sizes }))
}

/// GET /api/schema — the element descriptors the registry publishes, for
/// template editors.
pub async fn schema(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({ "elements": state.composer.registry().schema() }))
}
