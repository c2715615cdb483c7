//! Shipping addresses (`/shipping-addresses`) and shipping cost rules (`/shipping-costs`)

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Id, PageParams, Update, de_id, de_number, de_opt_number, split_update};
use crate::envelope::{Ack, Paginated, decode_ack, decode_list};
use crate::errors::ApiResult;
use crate::mutation::MutationEndpoint;
use crate::query::QueryEndpoint;
use crate::tags::{Tag, TagType};
use crate::transport::ApiRequest;

pub const SHIPPING_ADDRESSES_PATH: &str = "/shipping-addresses";
pub const SHIPPING_COSTS_PATH: &str = "/shipping-costs";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingAddress {
    #[serde(deserialize_with = "de_id", alias = "_id")]
    pub id: Id,
    #[serde(alias = "fullName")]
    pub full_name: String,
    pub phone: String,
    #[serde(alias = "addressLine1", alias = "address")]
    pub address_line1: String,
    #[serde(default, alias = "addressLine2")]
    pub address_line2: Option<String>,
    pub city: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, alias = "postalCode")]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
    #[serde(default, alias = "isDefault")]
    pub is_default: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddressInput {
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub is_default: bool,
}

/// A shipping cost rule for a region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingCost {
    #[serde(deserialize_with = "de_id", alias = "_id")]
    pub id: Id,
    pub region: String,
    #[serde(deserialize_with = "de_number")]
    pub cost: f64,
    #[serde(default, deserialize_with = "de_opt_number", alias = "freeShippingThreshold")]
    pub free_shipping_threshold: Option<f64>,
    #[serde(default, alias = "estimatedDays")]
    pub estimated_days: Option<u32>,
}

impl ShippingCost {
    /// Cost for an order subtotal, honoring the free shipping threshold
    pub fn cost_for(&self, subtotal: f64) -> f64 {
        match self.free_shipping_threshold {
            Some(threshold) if subtotal >= threshold => 0.0,
            _ => self.cost,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingCostInput {
    pub region: String,
    pub cost: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_shipping_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_days: Option<u32>,
}

fn decode_addresses(body: Value) -> ApiResult<Paginated<ShippingAddress>> {
    decode_list(body, &["addresses", "shippingAddresses"])
}

fn decode_costs(body: Value) -> ApiResult<Paginated<ShippingCost>> {
    decode_list(body, &["shippingCosts", "costs"])
}

pub fn get_shipping_addresses() -> QueryEndpoint<(), Paginated<ShippingAddress>> {
    QueryEndpoint::new("getShippingAddresses", |_: &()| {
        Ok(ApiRequest::get(SHIPPING_ADDRESSES_PATH))
    })
    .decode_with(decode_addresses)
    .provides_tags(&[TagType::ShippingAddress])
}

pub fn get_shipping_address() -> QueryEndpoint<Id, ShippingAddress> {
    QueryEndpoint::new("getShippingAddress", |id: &Id| {
        Ok(ApiRequest::get(format!("{SHIPPING_ADDRESSES_PATH}/{id}")))
    })
    .provides_with(|id: &Id, _: Option<&ShippingAddress>| {
        vec![Tag::id(TagType::ShippingAddress, id)]
    })
}

pub fn create_shipping_address() -> MutationEndpoint<ShippingAddressInput, ShippingAddress> {
    MutationEndpoint::new("createShippingAddress", |input: &ShippingAddressInput| {
        ApiRequest::post(SHIPPING_ADDRESSES_PATH).json(input)
    })
    .invalidates_tags(&[TagType::ShippingAddress])
}

pub fn update_shipping_address()
-> MutationEndpoint<Update<ShippingAddressInput>, ShippingAddress> {
    MutationEndpoint::new(
        "updateShippingAddress",
        |update: &Update<ShippingAddressInput>| {
            split_update(ApiRequest::put, SHIPPING_ADDRESSES_PATH, update)
        },
    )
    .invalidates_tags(&[TagType::ShippingAddress])
}

pub fn delete_shipping_address() -> MutationEndpoint<Id, Ack> {
    MutationEndpoint::new("deleteShippingAddress", |id: &Id| {
        Ok(ApiRequest::delete(format!("{SHIPPING_ADDRESSES_PATH}/{id}")))
    })
    .decode_with(decode_ack)
    .invalidates_tags(&[TagType::ShippingAddress])
}

/// Only one address is the default; all address views refresh
pub fn set_default_shipping_address() -> MutationEndpoint<Id, Ack> {
    MutationEndpoint::new("setDefaultShippingAddress", |id: &Id| {
        Ok(ApiRequest::put(format!("{SHIPPING_ADDRESSES_PATH}/{id}/default")))
    })
    .decode_with(decode_ack)
    .invalidates_tags(&[TagType::ShippingAddress])
}

pub fn get_shipping_costs() -> QueryEndpoint<PageParams, Paginated<ShippingCost>> {
    QueryEndpoint::new("getShippingCosts", |params: &PageParams| {
        ApiRequest::get(SHIPPING_COSTS_PATH).with_query(params)
    })
    .decode_with(decode_costs)
    .provides_tags(&[TagType::ShippingCost])
}

pub fn create_shipping_cost() -> MutationEndpoint<ShippingCostInput, ShippingCost> {
    MutationEndpoint::new("createShippingCost", |input: &ShippingCostInput| {
        ApiRequest::post(SHIPPING_COSTS_PATH).json(input)
    })
    .invalidates_tags(&[TagType::ShippingCost])
}

pub fn update_shipping_cost() -> MutationEndpoint<Update<ShippingCostInput>, ShippingCost> {
    MutationEndpoint::new("updateShippingCost", |update: &Update<ShippingCostInput>| {
        split_update(ApiRequest::put, SHIPPING_COSTS_PATH, update)
    })
    .invalidates_tags(&[TagType::ShippingCost])
}

pub fn delete_shipping_cost() -> MutationEndpoint<Id, Ack> {
    MutationEndpoint::new("deleteShippingCost", |id: &Id| {
        Ok(ApiRequest::delete(format!("{SHIPPING_COSTS_PATH}/{id}")))
    })
    .decode_with(decode_ack)
    .invalidates_tags(&[TagType::ShippingCost])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::Mutation;
    use crate::query::Query;
    use serde_json::json;

    #[test]
    fn decodes_addresses_with_camel_case_fields() {
        let body = json!({
            "success": true,
            "data": [{
                "_id": "a1", "fullName": "Ada Lovelace", "phone": "0123456789",
                "addressLine1": "1 Analytical St", "city": "London",
                "postalCode": "N1", "country": "UK", "isDefault": true
            }]
        });
        let list = get_shipping_addresses().decode(body).unwrap();
        assert!(list.items[0].is_default);
        assert_eq!(list.items[0].address_line1, "1 Analytical St");
    }

    #[test]
    fn address_body_matches_response_casing() {
        let input = ShippingAddressInput {
            full_name: "Ada Lovelace".into(),
            address_line1: "1 Analytical St".into(),
            postal_code: "N1".into(),
            is_default: true,
            ..ShippingAddressInput::default()
        };
        let request = create_shipping_address().request(&input).unwrap();
        let body = request.json_body().unwrap().clone();
        assert_eq!(body["fullName"], "Ada Lovelace");
        assert_eq!(body["addressLine1"], "1 Analytical St");
        assert_eq!(body["postalCode"], "N1");
        assert_eq!(body["isDefault"], true);

        let mut echoed = body;
        echoed["_id"] = json!("a1");
        let address: ShippingAddress = serde_json::from_value(echoed).unwrap();
        assert_eq!(address.postal_code, "N1");
        assert!(address.is_default);
    }

    #[test]
    fn set_default_uses_put() {
        let request = set_default_shipping_address()
            .request(&"a1".to_string())
            .unwrap();
        assert_eq!(request.path, "/shipping-addresses/a1/default");
        assert_eq!(request.method, crate::transport::Method::Put);
    }

    #[test]
    fn free_shipping_threshold_applies() {
        let cost = ShippingCost {
            id: "1".into(),
            region: "EU".into(),
            cost: 4.5,
            free_shipping_threshold: Some(50.0),
            estimated_days: None,
        };
        assert_eq!(cost.cost_for(49.99), 4.5);
        assert_eq!(cost.cost_for(50.0), 0.0);
    }
}
