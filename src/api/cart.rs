//! Shopping cart (`/api/carts`)
//!
//! Every cart query provides the `Cart` type tag and every cart mutation
//! invalidates it, so a single line change refetches the whole cart.

use serde::{Deserialize, Serialize};

use super::{Id, de_id, de_number};
use crate::envelope::{Ack, decode_ack};
use crate::mutation::MutationEndpoint;
use crate::query::QueryEndpoint;
use crate::tags::TagType;
use crate::transport::ApiRequest;

pub const CARTS_PATH: &str = "/api/carts";

/// One cart line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(deserialize_with = "de_id", alias = "_id")]
    pub id: Id,
    #[serde(deserialize_with = "de_id", alias = "productId")]
    pub product_id: Id,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "de_number")]
    pub price: f64,
    pub quantity: u32,
    #[serde(default)]
    pub image: Option<String>,
}

impl CartItem {
    pub fn subtotal(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default, deserialize_with = "de_id", alias = "_id")]
    pub id: Id,
    #[serde(default)]
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Number of units in the cart, as shown on the header badge
    pub fn item_count(&self) -> usize {
        self.items.iter().map(|item| item.quantity as usize).sum()
    }

    pub fn total(&self) -> f64 {
        self.items.iter().map(CartItem::subtotal).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddToCart {
    #[serde(rename = "productId")]
    pub product_id: Id,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCartItem {
    #[serde(skip)]
    pub item_id: Id,
    pub quantity: u32,
}

pub fn get_cart() -> QueryEndpoint<(), Cart> {
    QueryEndpoint::new("getCart", |_: &()| Ok(ApiRequest::get(CARTS_PATH)))
        .provides_tags(&[TagType::Cart])
}

pub fn add_to_cart() -> MutationEndpoint<AddToCart, Ack> {
    MutationEndpoint::new("addToCart", |item: &AddToCart| {
        ApiRequest::post(format!("{CARTS_PATH}/items")).json(item)
    })
    .decode_with(decode_ack)
    .invalidates_tags(&[TagType::Cart])
}

pub fn update_cart_item() -> MutationEndpoint<UpdateCartItem, Ack> {
    MutationEndpoint::new("updateCartItem", |update: &UpdateCartItem| {
        ApiRequest::put(format!("{CARTS_PATH}/items/{}", update.item_id)).json(update)
    })
    .decode_with(decode_ack)
    .invalidates_tags(&[TagType::Cart])
}

pub fn remove_cart_item() -> MutationEndpoint<Id, Ack> {
    MutationEndpoint::new("removeCartItem", |item_id: &Id| {
        Ok(ApiRequest::delete(format!("{CARTS_PATH}/items/{item_id}")))
    })
    .decode_with(decode_ack)
    .invalidates_tags(&[TagType::Cart])
}

pub fn clear_cart() -> MutationEndpoint<(), Ack> {
    MutationEndpoint::new("clearCart", |_: &()| Ok(ApiRequest::delete(CARTS_PATH)))
        .decode_with(decode_ack)
        .invalidates_tags(&[TagType::Cart])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Query;
    use serde_json::json;

    #[test]
    fn decodes_wrapped_cart_and_counts_units() {
        let body = json!({
            "success": true,
            "data": {
                "_id": "c1",
                "items": [
                    { "_id": "i1", "productId": "p1", "price": "10", "quantity": 2 },
                    { "_id": "i2", "productId": 5, "price": 2.5, "quantity": 1 }
                ]
            }
        });
        let cart = get_cart().decode(body).unwrap();
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.total(), 22.5);
        assert_eq!(cart.items[1].product_id, "5");
    }

    #[test]
    fn update_item_puts_quantity_only() {
        use crate::mutation::Mutation;
        let request = update_cart_item()
            .request(&UpdateCartItem {
                item_id: "i1".into(),
                quantity: 4,
            })
            .unwrap();
        assert_eq!(request.path, "/api/carts/items/i1");
        assert_eq!(request.json_body(), Some(&json!({ "quantity": 4 })));
    }
}
