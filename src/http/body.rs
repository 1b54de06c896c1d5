//! Request body decoding.
//!
//! # Responsibilities
//! - Pick a decoder from `Content-Type` (JSON or URL-encoded form)
//! - Enforce the per-type size limit before parsing
//! - Store the decoded value in request extensions for dispatch
//!
//! # Design Decisions
//! - Bodies of other content types are left unread and decode to `{}`
//! - An empty body decodes to `{}`
//! - Any JSON value is accepted at the top level
//! - Form keys use bracket syntax: `a[b]=c`, `a[]=x`, `a[0]=x`; repeated keys collect
//! - Nesting is capped at `MAX_FORM_DEPTH`; mixed scalar/nested keys keep every value

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde_json::{Map, Value};

use crate::config::LimitsConfig;
use crate::http::response::{GatewayError, INVALID_JSON};
use crate::http::server::AppState;
use crate::security::limits::{declared_length, read_limited};

/// Decoded request body, inserted as a request extension.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBody(pub Value);

impl Default for DecodedBody {
    fn default() -> Self {
        Self(Value::Object(Map::new()))
    }
}

/// Body encodings the gateway understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Json,
    Form,
}

impl BodyKind {
    /// Classify a request by its media type, ignoring parameters.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let content_type = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "application/json" => Some(BodyKind::Json),
            "application/x-www-form-urlencoded" => Some(BodyKind::Form),
            _ => None,
        }
    }

    pub fn limit(self, limits: &LimitsConfig) -> usize {
        match self {
            BodyKind::Json => limits.json_limit_bytes,
            BodyKind::Form => limits.form_limit_bytes,
        }
    }

    /// Parse raw bytes that are already known to be within the limit.
    pub fn decode(self, bytes: &[u8]) -> Result<Value, GatewayError> {
        if bytes.is_empty() {
            return Ok(DecodedBody::default().0);
        }
        match self {
            BodyKind::Json => serde_json::from_slice(bytes).map_err(|e| {
                tracing::debug!(error = %e, "Malformed JSON body");
                GatewayError::BadRequest(INVALID_JSON.to_string())
            }),
            BodyKind::Form => Ok(decode_form(bytes)),
        }
    }
}

/// Middleware decoding the body of every request before dispatch.
pub async fn decode_body(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let Some(kind) = BodyKind::from_headers(&parts.headers) else {
        parts.extensions.insert(DecodedBody::default());
        return next.run(Request::from_parts(parts, body)).await;
    };

    let limit = kind.limit(&state.limits);
    let decoded = match read_limited(body, declared_length(&parts.headers), limit).await {
        Ok(bytes) => kind.decode(&bytes).map(|value| (value, bytes)),
        Err(err) => Err(err),
    };

    match decoded {
        Ok((value, bytes)) => {
            parts.extensions.insert(DecodedBody(value));
            next.run(Request::from_parts(parts, Body::from(bytes))).await
        }
        Err(err) => {
            tracing::warn!(
                method = %parts.method,
                path = %parts.uri.path(),
                status = err.status().as_u16(),
                error = %err,
                "Request body rejected"
            );
            err.render(state.verbosity)
        }
    }
}

/// Bracket segments split off a form key; anything deeper stays one literal segment.
pub const MAX_FORM_DEPTH: usize = 5;

/// Largest `a[N]` index turned into an array slot; larger indices stay object keys.
pub const MAX_FORM_INDEX: usize = 20;

/// Decode `application/x-www-form-urlencoded` with bracket nesting.
pub fn decode_form(bytes: &[u8]) -> Value {
    let mut root = Map::new();
    for (key, value) in url::form_urlencoded::parse(bytes) {
        if key.is_empty() {
            continue;
        }
        let segments = key_segments(&key);
        let Some((head, rest)) = segments.split_first() else {
            continue;
        };
        let slot = root.entry(head.clone()).or_insert(Value::Null);
        assign(slot, rest, Value::String(value.into_owned()));
    }

    for value in root.values_mut() {
        compact_indices(value);
    }
    Value::Object(root)
}

/// `a[b][]` → `["a", "b", ""]`. Malformed brackets keep the key literal;
/// past [`MAX_FORM_DEPTH`] the unsplit tail becomes the last segment.
fn key_segments(key: &str) -> Vec<String> {
    let open = match key.find('[') {
        Some(open) if open > 0 => open,
        _ => return vec![key.to_string()],
    };

    let mut segments = vec![key[..open].to_string()];
    let mut rest = &key[open..];
    while let Some(inner) = rest.strip_prefix('[') {
        if segments.len() > MAX_FORM_DEPTH {
            segments.push(rest.to_string());
            return segments;
        }
        match inner.find(']') {
            Some(close) => {
                segments.push(inner[..close].to_string());
                rest = &inner[close + 1..];
            }
            None => return vec![key.to_string()],
        }
    }
    if !rest.is_empty() {
        return vec![key.to_string()];
    }
    segments
}

// `Null` marks a slot nothing has been written to yet; form values are never null.
// Recursion depth is bounded by `MAX_FORM_DEPTH`.
fn assign(slot: &mut Value, segments: &[String], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        merge_leaf(slot, value);
        return;
    };

    let child = if head.is_empty() {
        push_slot(slot)
    } else {
        object_slot(slot).map(|map| map.entry(head.clone()).or_insert(Value::Null))
    };
    if let Some(child) = child {
        assign(child, rest, value);
    }
}

/// Fresh slot for `a[]`. Objects take it under their next free index key.
fn push_slot(slot: &mut Value) -> Option<&mut Value> {
    if slot.is_object() {
        let map = slot.as_object_mut()?;
        let index = next_index(map);
        return Some(map.entry(index).or_insert(Value::Null));
    }

    let mut items = match slot.take() {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        scalar => vec![scalar],
    };
    items.push(Value::Null);
    *slot = Value::Array(items);
    slot.as_array_mut()?.last_mut()
}

/// View a slot as an object. Values already there are kept: array items and
/// a lone string move under their index keys (`"0"`, `"1"`, ...).
fn object_slot(slot: &mut Value) -> Option<&mut Map<String, Value>> {
    if !slot.is_object() {
        let map = match slot.take() {
            Value::Null => Map::new(),
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| (index.to_string(), item))
                .collect(),
            scalar => Map::from_iter([("0".to_string(), scalar)]),
        };
        *slot = Value::Object(map);
    }
    slot.as_object_mut()
}

fn next_index(map: &Map<String, Value>) -> String {
    let mut index = 0;
    while map.contains_key(&index.to_string()) {
        index += 1;
    }
    index.to_string()
}

fn merge_leaf(slot: &mut Value, value: Value) {
    match slot {
        Value::Null => *slot = value,
        Value::Array(items) => items.push(value),
        Value::Object(map) => {
            let index = next_index(map);
            map.insert(index, value);
        }
        other => {
            let previous = other.take();
            *other = Value::Array(vec![previous, value]);
        }
    }
}

/// Objects keyed only by canonical indices up to [`MAX_FORM_INDEX`] become
/// arrays in index order, so `a[1]=y&a[0]=x` gives `["x", "y"]`.
fn compact_indices(value: &mut Value) {
    match value {
        Value::Array(items) => items.iter_mut().for_each(compact_indices),
        Value::Object(map) => {
            map.values_mut().for_each(compact_indices);
            if is_index_map(map) {
                let mut entries: Vec<(usize, Value)> = std::mem::take(map)
                    .into_iter()
                    .filter_map(|(key, item)| key.parse::<usize>().ok().map(|index| (index, item)))
                    .collect();
                entries.sort_by_key(|(index, _)| *index);
                *value = Value::Array(entries.into_iter().map(|(_, item)| item).collect());
            }
        }
        _ => {}
    }
}

fn is_index_map(map: &Map<String, Value>) -> bool {
    !map.is_empty()
        && map.keys().all(|key| match key.parse::<usize>() {
            Ok(index) => index <= MAX_FORM_INDEX && index.to_string() == *key,
            Err(_) => false,
        })
}
