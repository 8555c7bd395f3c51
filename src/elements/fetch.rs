//! Network-backed structural elements: `"json_api"` fetches a JSON document
//! and projects it onto its children; `"grocy_api"` is the same with grocy
//! authentication; `"grocy_entry"` is sugar that turns a grocycode into the
//! matching grocy object request.
//!
//! Network and parse failures are soft: the branch logs and renders nothing
//! further, the rest of the label still paints.

use serde_json::{Map, Value, json};

use crate::canvas::Canvas;
use crate::compose::Composer;
use crate::context::LabelContext;
use crate::elements::{ElementHandler, Frame};
use crate::error::RotuloError;
use crate::template::{Element, Payload};

pub struct JsonApiHandler;

impl ElementHandler for JsonApiHandler {
    fn kind(&self) -> &'static str {
        "json_api"
    }

    fn process(
        &self,
        element: &Element,
        composer: &Composer,
        canvas: &mut Canvas,
        frame: &Frame,
        payload: &mut Payload,
        ctx: &LabelContext,
    ) -> Result<(), RotuloError> {
        let Some(endpoint) = element.endpoint.clone() else {
            eprintln!("[fetch] json_api without endpoint, skipping");
            return Ok(());
        };
        let response = call_json(composer, element, &endpoint, None, ctx, payload)?;
        project_children(&response, element, composer, canvas, frame, payload, ctx)
    }

    fn schema_definition(&self) -> Option<Value> {
        Some(json!({
            "type": "json_api",
            "description": "Fetch a JSON document and feed it to the children",
            "fields": {
                "endpoint": "request URL",
                "method": "get | post | put | delete (default get)",
                "headers": "extra request headers",
                "data": "JSON request body (object)",
                "datakey": "context/payload key injected into the body",
                "datakeyname": "body field name for the injected value",
                "elements": "children, each projected by its own key",
            },
        }))
    }
}

pub struct GrocyApiHandler;

impl ElementHandler for GrocyApiHandler {
    fn kind(&self) -> &'static str {
        "grocy_api"
    }

    fn process(
        &self,
        element: &Element,
        composer: &Composer,
        canvas: &mut Canvas,
        frame: &Frame,
        payload: &mut Payload,
        ctx: &LabelContext,
    ) -> Result<(), RotuloError> {
        let Some(endpoint) = grocy_endpoint(element, ctx) else {
            eprintln!("[fetch] grocy_api without endpoint, skipping");
            return Ok(());
        };
        let url = match element.api_path.as_deref() {
            Some(path) => join_url(&endpoint, path),
            None => endpoint,
        };
        let api_key = grocy_api_key(element, ctx);
        let response = call_json(composer, element, &url, api_key.as_deref(), ctx, payload)?;
        project_children(&response, element, composer, canvas, frame, payload, ctx)
    }

    fn schema_definition(&self) -> Option<Value> {
        Some(json!({
            "type": "grocy_api",
            "description": "Fetch from a grocy instance with API-key auth",
            "fields": {
                "endpoint": "grocy base URL (or context key 'grocy_endpoint')",
                "api_path": "path under the base URL",
                "api_key": "API key (or context key 'grocy_api_key')",
                "elements": "children, each projected by its own key",
            },
        }))
    }
}

/// Composite sugar: a `grcy:TYPE:ID[:STOCK]` code becomes the matching
/// object request. The stored template is never mutated; a rewritten copy
/// of the node is dispatched as `"json_api"`.
pub struct GrocyEntryHandler;

impl ElementHandler for GrocyEntryHandler {
    fn kind(&self) -> &'static str {
        "grocy_entry"
    }

    fn process(
        &self,
        element: &Element,
        composer: &Composer,
        canvas: &mut Canvas,
        frame: &Frame,
        payload: &mut Payload,
        ctx: &LabelContext,
    ) -> Result<(), RotuloError> {
        // A missing or malformed grocycode skips the branch; the rest of
        // the label still paints.
        let Some(grocycode) = element
            .grocycode
            .clone()
            .or_else(|| lookup_string(ctx, payload, "grocycode"))
        else {
            eprintln!("[fetch] grocy_entry without a grocycode, skipping");
            return Ok(());
        };
        let api_path = match grocycode_api_path(&grocycode) {
            Ok(path) => path,
            Err(e) => {
                eprintln!("[fetch] grocy_entry skipped: {}", e);
                return Ok(());
            }
        };

        let Some(endpoint) = grocy_endpoint(element, ctx) else {
            eprintln!("[fetch] grocy_entry without endpoint, skipping");
            return Ok(());
        };
        let mut headers = element.headers.clone().unwrap_or_default();
        if let Some(key) = grocy_api_key(element, ctx) {
            headers.insert("GROCY-API-KEY".to_string(), Value::String(key));
        }

        let mut rewritten = element.clone();
        rewritten.kind = "json_api".to_string();
        rewritten.endpoint = Some(join_url(&endpoint, &api_path));
        rewritten.method = Some("get".to_string());
        rewritten.headers = Some(headers);
        rewritten.grocycode = None;
        composer.process_element(&rewritten, canvas, frame, payload, ctx)
    }

    fn schema_definition(&self) -> Option<Value> {
        Some(json!({
            "type": "grocy_entry",
            "description": "Fetch the grocy object a grocycode names",
            "fields": {
                "grocycode": "grcy:TYPE:ID code (or context/payload key 'grocycode')",
                "endpoint": "grocy base URL (or context key 'grocy_endpoint')",
                "api_key": "API key (or context key 'grocy_api_key')",
                "elements": "children, each projected by its own key",
            },
        }))
    }
}

// ----------------------------------------------------------------------------

/// Perform the HTTP call and parse the JSON reply. All failures are `Http`
/// so the composer degrades the branch.
fn call_json(
    composer: &Composer,
    element: &Element,
    url: &str,
    api_key: Option<&str>,
    ctx: &LabelContext,
    payload: &Payload,
) -> Result<Value, RotuloError> {
    let method = element
        .method
        .as_deref()
        .unwrap_or("get")
        .to_ascii_lowercase();
    let http = composer.http();
    let mut request = match method.as_str() {
        "get" => http.get(url),
        "post" => http.post(url),
        "put" => http.put(url),
        "delete" => http.delete(url),
        other => {
            return Err(RotuloError::Http(format!(
                "unsupported method '{}' for {}",
                other, url
            )));
        }
    };

    request = request.header("accept", "application/json");
    if let Some(key) = api_key {
        request = request.header("GROCY-API-KEY", key);
    }
    if let Some(headers) = &element.headers {
        for (name, value) in headers {
            if let Some(value) = value.as_str() {
                request = request.header(name.as_str(), value);
            }
        }
    }

    if let Some(body) = request_body(element, ctx, payload) {
        request = request.json(&body);
    }

    let response = request
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(|e| RotuloError::Http(format!("request to {} failed: {}", url, e)))?;
    response
        .json()
        .map_err(|e| RotuloError::Http(format!("invalid JSON from {}: {}", url, e)))
}

/// Request body: the element's literal `data` object, with the `datakey`
/// indirection folded in — when the context or payload holds the named key,
/// its value is inserted under `datakeyname` (or the key itself).
fn request_body(element: &Element, ctx: &LabelContext, payload: &Payload) -> Option<Map<String, Value>> {
    let mut body = match &element.data {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };
    if let Some(datakey) = element.datakey.as_deref() {
        if let Some(value) = ctx
            .lookup(datakey)
            .or_else(|| payload.get(datakey).cloned().filter(|v| !v.is_null()))
        {
            let field = element.datakeyname.as_deref().unwrap_or(datakey);
            body.insert(field.to_string(), value);
        }
    }
    if body.is_empty() { None } else { Some(body) }
}

/// Feed the response to each child: a child naming a `key` present in an
/// object response gets that member as its data, everyone else gets the
/// whole response.
fn project_children(
    response: &Value,
    element: &Element,
    composer: &Composer,
    canvas: &mut Canvas,
    frame: &Frame,
    payload: &mut Payload,
    ctx: &LabelContext,
) -> Result<(), RotuloError> {
    for child in &element.children {
        let value = child
            .key
            .as_deref()
            .and_then(|key| response.get(key))
            .filter(|v| !v.is_null())
            .unwrap_or(response);
        // projection feeds base data; the child must not re-resolve the
        // same key against context/payload
        let mut fed = child.with_data(value.clone());
        fed.key = None;
        composer.process_element(&fed, canvas, frame, payload, ctx)?;
    }
    Ok(())
}

fn lookup_string(ctx: &LabelContext, payload: &Payload, key: &str) -> Option<String> {
    ctx.lookup(key)
        .or_else(|| payload.get(key).cloned())
        .and_then(|v| match v {
            Value::String(s) => Some(s),
            Value::Null => None,
            other => Some(other.to_string()),
        })
}

fn grocy_endpoint(element: &Element, ctx: &LabelContext) -> Option<String> {
    element
        .endpoint
        .clone()
        .or_else(|| ctx.lookup("grocy_endpoint").and_then(|v| v.as_str().map(String::from)))
}

fn grocy_api_key(element: &Element, ctx: &LabelContext) -> Option<String> {
    element
        .api_key
        .clone()
        .or_else(|| ctx.lookup("grocy_api_key").and_then(|v| v.as_str().map(String::from)))
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Map a `grcy:TYPE:ID[:STOCK]` code onto the grocy API path. Products go
/// through the stock endpoint; a stock segment narrows the request to the
/// matching stock entries.
fn grocycode_api_path(grocycode: &str) -> Result<String, RotuloError> {
    let mut parts = grocycode.split(':');
    let bad = || RotuloError::Lookup(format!("invalid grocycode '{}'", grocycode));
    if parts.next() != Some("grcy") {
        return Err(bad());
    }
    let kind = parts.next().ok_or_else(bad)?;
    let id: u64 = parts.next().and_then(|s| s.parse().ok()).ok_or_else(bad)?;
    match kind {
        "p" => Ok(match parts.next() {
            Some(stock) => format!(
                "api/stock/products/{}/entries?query%5B%5D=stock_id%3D{}",
                id, stock
            ),
            None => format!("api/stock/products/{}", id),
        }),
        "c" => Ok(format!("api/chores/{}", id)),
        "b" => Ok(format!("api/battery/{}", id)),
        _ => Err(bad()),
    }
}
