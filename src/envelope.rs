//! Response envelope normalisation.
//!
//! The backend wraps payloads inconsistently across resources:
//!
//! - `{ "data": <payload>, "message": "...", "pagination": {...} }`
//! - `{ "success": true, "data": <payload>, "message": "..." }`
//! - `{ "data": { "data": [...], "pagination": {...} } }`
//! - `{ "data": { "products": [...] } }`
//! - a bare payload
//!
//! Every slice decodes through this module right after the transport call, so
//! nothing downstream probes `.data.data ?? .data ?? []`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{ApiError, ApiResult};

/// Page metadata of a list response
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub total: u64,
    #[serde(default, alias = "total_pages", alias = "pages")]
    pub total_pages: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// A normalised list payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: Option<Pagination>,
}

impl<T> Default for Paginated<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            pagination: None,
        }
    }
}

impl<T> Paginated<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether a page after the current one exists
    pub fn has_next_page(&self) -> bool {
        self.pagination
            .as_ref()
            .is_some_and(|p| p.page < p.total_pages)
    }
}

/// A decoded response body split into its parts
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub payload: Value,
    pub message: Option<String>,
    pub pagination: Option<Pagination>,
}

const ENVELOPE_KEYS: &[&str] = &[
    "data",
    "success",
    "message",
    "pagination",
    "status",
    "page",
    "total",
    "totalPages",
    "limit",
];

fn is_wrapper(map: &Map<String, Value>) -> bool {
    map.contains_key("data") && map.keys().all(|key| ENVELOPE_KEYS.contains(&key.as_str()))
}

fn pagination_from(map: &Map<String, Value>) -> Option<Pagination> {
    if let Some(pagination) = map.get("pagination") {
        return serde_json::from_value(pagination.clone()).ok();
    }
    if map.contains_key("totalPages") || map.contains_key("total_pages") {
        return serde_json::from_value(Value::Object(map.clone())).ok();
    }
    None
}

impl Envelope {
    /// Split `body` into payload, message and pagination.
    ///
    /// A 2xx body carrying `success: false` is turned into an error so callers do
    /// not render a failure as data.
    pub fn parse(body: Value) -> ApiResult<Self> {
        if let Value::Object(map) = &body {
            if map.get("success").and_then(Value::as_bool) == Some(false) {
                return Err(ApiError::Http { status: 200, data: body });
            }
        }

        let mut message = None;
        let mut pagination = None;
        let mut payload = body;

        // Unwrap at most two envelope layers: `{data: {data: ...}}`
        for _ in 0..2 {
            let Value::Object(map) = &payload else {
                break;
            };
            if !is_wrapper(map) {
                break;
            }
            if message.is_none() {
                message = map.get("message").and_then(Value::as_str).map(str::to_string);
            }
            if pagination.is_none() {
                pagination = pagination_from(map);
            }
            payload = match payload {
                Value::Object(mut map) => map.remove("data").unwrap_or(Value::Null),
                other => other,
            };
        }

        if pagination.is_none() {
            if let Value::Object(map) = &payload {
                pagination = pagination_from(map);
            }
        }

        Ok(Self {
            payload,
            message,
            pagination,
        })
    }

    /// Decode the payload as `T`
    pub fn into_data<T: DeserializeOwned>(self) -> ApiResult<T> {
        Ok(serde_json::from_value(self.payload)?)
    }

    /// Decode the payload as a list, looking under `collection` keys when the payload
    /// is an object. A missing list normalises to empty.
    pub fn into_list<T: DeserializeOwned>(self, collections: &[&str]) -> ApiResult<Paginated<T>> {
        let pagination = self.pagination;
        let items = match self.payload {
            Value::Array(items) => Value::Array(items),
            Value::Null => Value::Array(Vec::new()),
            Value::Object(mut map) => collections
                .iter()
                .chain(["items", "rows", "results"].iter())
                .find_map(|key| match map.remove(*key) {
                    Some(list @ Value::Array(_)) => Some(list),
                    _ => None,
                })
                .unwrap_or(Value::Array(Vec::new())),
            other => {
                return Err(ApiError::Parsing(format!("expected a list payload, got {other}")));
            }
        };
        Ok(Paginated {
            items: serde_json::from_value(items)?,
            pagination,
        })
    }
}

/// Decode a single-object response
pub fn decode_data<T: DeserializeOwned>(body: Value) -> ApiResult<T> {
    Envelope::parse(body)?.into_data()
}

/// Decode a list response; see [`Envelope::into_list`]
pub fn decode_list<T: DeserializeOwned>(body: Value, collections: &[&str]) -> ApiResult<Paginated<T>> {
    Envelope::parse(body)?.into_list(collections)
}

/// Decode a response whose payload is irrelevant, keeping the backend message
pub fn decode_ack(body: Value) -> ApiResult<Ack> {
    let envelope = Envelope::parse(body)?;
    Ok(Ack {
        message: envelope.message,
    })
}

/// Acknowledgement of a mutation whose response carries no entity
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ack {
    pub message: Option<String>,
}
