//! Administrative surface.
//!
//! A transport-agnostic request/response router over a [`RuleStore`]: rule and
//! preset CRUD, default preset selection, transform, score and detect calls,
//! and the detection log. Any HTTP (or other) server can forward requests to
//! [`handle`] and write the [`AdminResponse`] back unchanged.
//!
//! Paths may carry an `/api` prefix. Bodies are JSON; errors are always
//! `{"error": <message>, "status": <code>}`.
//!
//! ```text
//! 404  unknown id or unknown route      400  body fails the schema
//! 405  known route, wrong method        409  duplicate id / protected preset
//! ```

use crate::api::{Options, RuleSelection, clean_with};
use crate::detect::{DetectError, DetectorPanel};
use crate::document::Document;
use crate::score::{human_likeness_score, score_breakdown};
use crate::store::{NewDetectionLog, RuleStore, StoreError};
use crate::{NewPreset, NewRule};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl FromStr for Method {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            _ => Err(ApiError::BadRequest(format!("unsupported method '{s}'"))),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdminRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl AdminRequest {
    pub fn get(path: impl Into<String>) -> Self {
        AdminRequest { method: Method::Get, path: path.into(), body: None }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        AdminRequest { method: Method::Post, path: path.into(), body: Some(body) }
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        AdminRequest { method: Method::Put, path: path.into(), body: Some(body) }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        AdminRequest { method: Method::Delete, path: path.into(), body: None }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdminResponse {
    pub status: u16,
    /// `None` for `204 No Content`.
    pub body: Option<Value>,
}

impl AdminResponse {
    fn ok(body: Value) -> Self {
        AdminResponse { status: 200, body: Some(body) }
    }

    fn created(body: Value) -> Self {
        AdminResponse { status: 201, body: Some(body) }
    }

    fn no_content() -> Self {
        AdminResponse { status: 204, body: None }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("route not found: {0}")]
    RouteNotFound(String),

    #[error("method {method} not allowed on {path}")]
    MethodNotAllowed { method: Method, path: String },

    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            ApiError::NotFound(_) | ApiError::RouteNotFound(_) => 404,
            ApiError::MethodNotAllowed { .. } => 405,
            ApiError::BadRequest(_) => 400,
            ApiError::Conflict(_) => 409,
            ApiError::Internal(_) => 500,
        }
    }

    pub fn into_response(self) -> AdminResponse {
        let status = self.status();
        if status >= 500 {
            tracing::error!(error = %self, "admin request failed");
        }
        AdminResponse { status, body: Some(json!({ "error": self.to_string(), "status": status })) }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::RuleNotFound(_) | StoreError::PresetNotFound(_) => ApiError::NotFound(err.to_string()),
            StoreError::InvalidRule(_) | StoreError::InvalidPreset(_) => ApiError::BadRequest(err.to_string()),
            StoreError::DuplicateRule(_)
            | StoreError::DefaultPresetProtected(_)
            | StoreError::LastPresetProtected(_) => ApiError::Conflict(err.to_string()),
            StoreError::Io { .. } | StoreError::Json { .. } => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<DetectError> for ApiError {
    fn from(err: DetectError) -> Self {
        match err {
            DetectError::EmptyText => ApiError::BadRequest("valid text is required".to_string()),
            DetectError::Unavailable { .. } => ApiError::Internal(err.to_string()),
        }
    }
}

/// Handle `request` against `store`, answering detection calls locally.
pub fn handle(store: &mut RuleStore, request: &AdminRequest) -> AdminResponse {
    handle_with_detectors(store, &DetectorPanel::new(), request)
}

/// Handle `request` against `store`, routing detection calls to `panel`.
pub fn handle_with_detectors(store: &mut RuleStore, panel: &DetectorPanel, request: &AdminRequest) -> AdminResponse {
    let response = dispatch(store, panel, request).unwrap_or_else(ApiError::into_response);
    tracing::debug!(method = %request.method, path = %request.path, status = response.status, "admin request");
    response
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route<'p> {
    Health,
    Rules,
    Rule(&'p str),
    Presets,
    DefaultPreset,
    Preset(&'p str),
    MakeDefault(&'p str),
    Transform,
    Score,
    Detect,
    DetectionLogs,
}

fn route(path: &str) -> Option<Route<'_>> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.first() == Some(&"api") {
        segments.remove(0);
    }

    let route = match *segments.as_slice() {
        ["health"] => Route::Health,
        ["rules"] => Route::Rules,
        ["rules", id] => Route::Rule(id),
        ["presets"] => Route::Presets,
        ["presets", "default"] => Route::DefaultPreset,
        ["presets", id] => Route::Preset(id),
        ["presets", id, "default"] => Route::MakeDefault(id),
        ["transform"] => Route::Transform,
        ["score"] => Route::Score,
        ["detect"] => Route::Detect,
        ["detection-logs"] => Route::DetectionLogs,
        _ => return None,
    };
    Some(route)
}

fn dispatch(store: &mut RuleStore, panel: &DetectorPanel, req: &AdminRequest) -> Result<AdminResponse, ApiError> {
    let route = route(&req.path).ok_or_else(|| ApiError::RouteNotFound(req.path.clone()))?;

    match (req.method, route) {
        (Method::Get, Route::Health) => Ok(AdminResponse::ok(json!({ "status": "ok" }))),

        (Method::Get, Route::Rules) => Ok(AdminResponse::ok(to_json(store.list_rules())?)),
        (Method::Post, Route::Rules) => {
            let rule = store.create_rule(body(req)?)?;
            Ok(AdminResponse::created(to_json(&rule)?))
        }
        (Method::Get, Route::Rule(id)) => {
            let rule = store.get_rule(id).ok_or_else(|| StoreError::RuleNotFound(id.to_string()))?;
            Ok(AdminResponse::ok(to_json(rule)?))
        }
        (Method::Put, Route::Rule(id)) => {
            let rule = store.update_rule(id, body::<NewRule>(req)?)?;
            Ok(AdminResponse::ok(to_json(&rule)?))
        }
        (Method::Delete, Route::Rule(id)) => {
            store.delete_rule(id)?;
            Ok(AdminResponse::no_content())
        }

        (Method::Get, Route::Presets) => Ok(AdminResponse::ok(to_json(store.list_presets())?)),
        (Method::Post, Route::Presets) => {
            let preset = store.create_preset(body(req)?)?;
            Ok(AdminResponse::created(to_json(&preset)?))
        }
        (Method::Get, Route::DefaultPreset) => {
            let preset = store.default_preset().ok_or_else(|| ApiError::NotFound("no presets defined".to_string()))?;
            Ok(AdminResponse::ok(to_json(preset)?))
        }
        (Method::Get, Route::Preset(id)) => {
            let preset = store.get_preset(id).ok_or_else(|| StoreError::PresetNotFound(id.to_string()))?;
            Ok(AdminResponse::ok(to_json(preset)?))
        }
        (Method::Put, Route::Preset(id)) => {
            let preset = store.update_preset(id, body::<NewPreset>(req)?)?;
            Ok(AdminResponse::ok(to_json(&preset)?))
        }
        (Method::Delete, Route::Preset(id)) => {
            store.delete_preset(id)?;
            Ok(AdminResponse::no_content())
        }
        (Method::Put, Route::MakeDefault(id)) => {
            let preset = store.set_default_preset(id)?;
            Ok(AdminResponse::ok(to_json(preset)?))
        }

        (Method::Post, Route::Transform) => transform(store, body(req)?),
        (Method::Post, Route::Score) => {
            let TextBody { text } = text_body(req)?;
            Ok(AdminResponse::ok(json!({
                "score": human_likeness_score(&text),
                "breakdown": to_json(&score_breakdown(&text))?,
            })))
        }
        (Method::Post, Route::Detect) => {
            let TextBody { text } = text_body(req)?;
            Ok(AdminResponse::ok(to_json(&panel.detect(&text)?)?))
        }

        (Method::Get, Route::DetectionLogs) => Ok(AdminResponse::ok(to_json(store.detection_logs())?)),
        (Method::Post, Route::DetectionLogs) => {
            let log = store.log_detection(body::<NewDetectionLog>(req)?);
            Ok(AdminResponse::created(to_json(&log)?))
        }

        (method, _) => Err(ApiError::MethodNotAllowed { method, path: req.path.clone() }),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransformBody {
    #[serde(default)]
    document: Option<Document>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    preset_id: Option<String>,
    #[serde(default)]
    rule_ids: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct TextBody {
    text: String,
}

fn transform(store: &RuleStore, body: TransformBody) -> Result<AdminResponse, ApiError> {
    let doc = match (body.document, body.text) {
        (Some(doc), _) => doc,
        (None, Some(text)) => Document::from_plain_text(&text),
        (None, None) => return Err(ApiError::BadRequest("either 'document' or 'text' is required".to_string())),
    };
    let selection = match (body.rule_ids, body.preset_id) {
        (Some(ids), _) => RuleSelection::Rules(ids),
        (None, Some(id)) => RuleSelection::Preset(id),
        (None, None) => RuleSelection::DefaultPreset,
    };

    let out = clean_with(&doc, store, &Options { selection })?;
    Ok(AdminResponse::ok(json!({
        "document": to_json(&out.document)?,
        "plainText": out.plain_text,
        "score": out.score_after,
    })))
}

fn text_body(req: &AdminRequest) -> Result<TextBody, ApiError> {
    let parsed: TextBody =
        body(req).map_err(|_| ApiError::BadRequest("valid text is required".to_string()))?;
    if parsed.text.is_empty() {
        return Err(ApiError::BadRequest("valid text is required".to_string()));
    }
    Ok(parsed)
}

fn body<T: DeserializeOwned>(req: &AdminRequest) -> Result<T, ApiError> {
    let value = req.body.clone().ok_or_else(|| ApiError::BadRequest("request body is required".to_string()))?;
    serde_json::from_value(value).map_err(|err| ApiError::BadRequest(err.to_string()))
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|err| ApiError::Internal(err.to_string()))
}
