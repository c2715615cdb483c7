//! Endpoint slices, one module per backend resource.
//!
//! Every slice exposes constructor functions returning [`QueryEndpoint`] or
//! [`MutationEndpoint`] values, together with the entity and payload types they
//! carry. Queries declare the tags they provide and mutations the tags they
//! invalidate, so a confirmed write refreshes every view showing affected data.
//!
//! [`QueryEndpoint`]: crate::query::QueryEndpoint
//! [`MutationEndpoint`]: crate::mutation::MutationEndpoint

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::errors::{ApiError, ApiResult};
use crate::transport::ApiRequest;

pub mod cart;
pub mod categories;
pub mod orders;
pub mod payments;
pub mod products;
pub mod roles;
pub mod shipping;
pub mod supplier_items;
pub mod uploads;
pub mod users;
pub mod wishlist;

/// Backend identifiers arrive as numbers or strings depending on the resource;
/// they are normalised to strings client-side.
pub type Id = String;

/// Deserialize an id that may be a JSON number or string
pub fn de_id<'de, D>(deserializer: D) -> Result<Id, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        Value::Null => Ok(Id::new()),
        other => Err(serde::de::Error::custom(format!("invalid id: {other}"))),
    }
}

/// Like [`de_id`] for optional ids
pub fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<Id>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(Some(id)),
        Value::Number(id) => Ok(Some(id.to_string())),
        Value::Null => Ok(None),
        other => Err(serde::de::Error::custom(format!("invalid id: {other}"))),
    }
}

/// Deserialize a number that may be sent as a string (`"19.99"`)
pub fn de_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(number) => Ok(number.as_f64().unwrap_or_default()),
        Value::String(text) if text.trim().is_empty() => Ok(0.0),
        Value::String(text) => text.trim().parse().map_err(serde::de::Error::custom),
        Value::Null => Ok(0.0),
        other => Err(serde::de::Error::custom(format!("invalid number: {other}"))),
    }
}

/// Like [`de_number`] for optional numbers; blank strings read as `None`
pub fn de_opt_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(number) => Ok(number.as_f64()),
        Value::String(text) if text.trim().is_empty() => Ok(None),
        Value::String(text) => text.trim().parse().map(Some).map_err(serde::de::Error::custom),
        Value::Null => Ok(None),
        other => Err(serde::de::Error::custom(format!("invalid number: {other}"))),
    }
}

/// A `{ id, ..rest }` update payload: `id` goes into the URL path, `rest` is the body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Update<T> {
    pub id: Id,
    #[serde(flatten)]
    pub changes: T,
}

impl<T> Update<T> {
    pub fn new(id: impl Into<Id>, changes: T) -> Self {
        Self {
            id: id.into(),
            changes,
        }
    }
}

/// Build a `method path/{id}` request with `changes` as the JSON body
pub(crate) fn split_update<T: Serialize>(
    request: fn(String) -> ApiRequest,
    base: &str,
    update: &Update<T>,
) -> ApiResult<ApiRequest> {
    if update.id.trim().is_empty() {
        return Err(ApiError::Parsing(format!("missing id for {base} update")));
    }
    request(format!("{base}/{}", update.id)).json(&update.changes)
}

/// Common list parameters shared by most back-office tables
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl PageParams {
    pub fn page(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
            search: None,
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Row {
        #[serde(deserialize_with = "de_id")]
        id: Id,
        #[serde(deserialize_with = "de_number")]
        price: f64,
        #[serde(default, deserialize_with = "de_opt_number")]
        discount: Option<f64>,
    }

    #[test]
    fn ids_and_numbers_accept_strings_and_numbers() {
        let row: Row = serde_json::from_value(json!({ "id": 7, "price": "19.5", "discount": "" })).unwrap();
        assert_eq!(row.id, "7");
        assert_eq!(row.price, 19.5);
        assert_eq!(row.discount, None);
    }

    #[test]
    fn update_splits_id_into_path() {
        let update = Update::new("12", json!({ "name": "Shoes" }));
        let request = split_update(ApiRequest::put, "/categories", &update).unwrap();
        assert_eq!(request.path, "/categories/12");
        assert_eq!(request.json_body(), Some(&json!({ "name": "Shoes" })));

        let missing = Update::new(" ", json!({}));
        assert!(split_update(ApiRequest::put, "/categories", &missing).is_err());
    }
}
