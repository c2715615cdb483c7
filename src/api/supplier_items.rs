//! Items sourced from suppliers (`/supplier-items`)

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Id, PageParams, Update, de_id, de_number, de_opt_id, split_update};
use crate::envelope::{Ack, Paginated, decode_ack, decode_list};
use crate::errors::ApiResult;
use crate::mutation::MutationEndpoint;
use crate::query::QueryEndpoint;
use crate::tags::{Tag, TagType};
use crate::transport::ApiRequest;

pub const SUPPLIER_ITEMS_PATH: &str = "/supplier-items";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierItem {
    #[serde(deserialize_with = "de_id", alias = "_id")]
    pub id: Id,
    #[serde(alias = "supplierName")]
    pub supplier_name: String,
    #[serde(alias = "itemName", alias = "name")]
    pub item_name: String,
    #[serde(default, deserialize_with = "de_opt_id", alias = "productId")]
    pub product_id: Option<Id>,
    #[serde(deserialize_with = "de_number", alias = "unitCost")]
    pub unit_cost: f64,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default, alias = "contactEmail")]
    pub contact_email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierItemInput {
    pub supplier_name: String,
    pub item_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<Id>,
    pub unit_cost: f64,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
}

fn decode_supplier_items(body: Value) -> ApiResult<Paginated<SupplierItem>> {
    decode_list(body, &["supplierItems", "items"])
}

pub fn get_supplier_items() -> QueryEndpoint<PageParams, Paginated<SupplierItem>> {
    QueryEndpoint::new("getSupplierItems", |params: &PageParams| {
        ApiRequest::get(SUPPLIER_ITEMS_PATH).with_query(params)
    })
    .decode_with(decode_supplier_items)
    .provides_tags(&[TagType::SupplierItem])
}

pub fn get_supplier_item() -> QueryEndpoint<Id, SupplierItem> {
    QueryEndpoint::new("getSupplierItem", |id: &Id| {
        Ok(ApiRequest::get(format!("{SUPPLIER_ITEMS_PATH}/{id}")))
    })
    .provides_with(|id: &Id, _: Option<&SupplierItem>| vec![Tag::id(TagType::SupplierItem, id)])
}

/// Received supplier stock feeds product inventory
pub fn create_supplier_item() -> MutationEndpoint<SupplierItemInput, SupplierItem> {
    MutationEndpoint::new("createSupplierItem", |input: &SupplierItemInput| {
        ApiRequest::post(SUPPLIER_ITEMS_PATH).json(input)
    })
    .invalidates_tags(&[TagType::SupplierItem, TagType::Product])
}

pub fn update_supplier_item() -> MutationEndpoint<Update<SupplierItemInput>, SupplierItem> {
    MutationEndpoint::new("updateSupplierItem", |update: &Update<SupplierItemInput>| {
        split_update(ApiRequest::put, SUPPLIER_ITEMS_PATH, update)
    })
    .invalidates_tags(&[TagType::SupplierItem, TagType::Product])
}

pub fn delete_supplier_item() -> MutationEndpoint<Id, Ack> {
    MutationEndpoint::new("deleteSupplierItem", |id: &Id| {
        Ok(ApiRequest::delete(format!("{SUPPLIER_ITEMS_PATH}/{id}")))
    })
    .decode_with(decode_ack)
    .invalidates_tags(&[TagType::SupplierItem])
}
