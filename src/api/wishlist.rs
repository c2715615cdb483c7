//! Customer wishlist (`/wishlist`)

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Id;
use super::products::Product;
use crate::envelope::{Ack, Envelope, decode_ack};
use crate::errors::ApiResult;
use crate::mutation::MutationEndpoint;
use crate::query::QueryEndpoint;
use crate::tags::TagType;
use crate::transport::ApiRequest;

pub const WISHLIST_PATH: &str = "/wishlist";

/// Wishlisted products, in the order they were added
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wishlist {
    pub products: Vec<Product>,
}

impl Wishlist {
    pub fn contains(&self, product_id: &str) -> bool {
        self.products.iter().any(|product| product.id == product_id)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistItem {
    #[serde(rename = "productId")]
    pub product_id: Id,
}

/// The backend answers either `{products: [...]}`, `{items: [...]}` or a bare list
fn decode_wishlist(body: Value) -> ApiResult<Wishlist> {
    let list = Envelope::parse(body)?.into_list::<Product>(&["products", "wishlist"])?;
    Ok(Wishlist {
        products: list.items,
    })
}

pub fn get_wishlist() -> QueryEndpoint<(), Wishlist> {
    QueryEndpoint::new("getWishlist", |_: &()| Ok(ApiRequest::get(WISHLIST_PATH)))
        .decode_with(decode_wishlist)
        .provides_tags(&[TagType::Wishlist])
}

pub fn add_to_wishlist() -> MutationEndpoint<WishlistItem, Ack> {
    MutationEndpoint::new("addToWishlist", |item: &WishlistItem| {
        ApiRequest::post(WISHLIST_PATH).json(item)
    })
    .decode_with(decode_ack)
    .invalidates_tags(&[TagType::Wishlist])
}

pub fn remove_from_wishlist() -> MutationEndpoint<Id, Ack> {
    MutationEndpoint::new("removeFromWishlist", |product_id: &Id| {
        Ok(ApiRequest::delete(format!("{WISHLIST_PATH}/{product_id}")))
    })
    .decode_with(decode_ack)
    .invalidates_tags(&[TagType::Wishlist])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Query;
    use serde_json::json;

    #[test]
    fn decodes_keyed_and_bare_wishlists() {
        let keyed = get_wishlist()
            .decode(json!({ "data": { "products": [{ "id": 1, "name": "Lamp", "price": 5 }] } }))
            .unwrap();
        assert!(keyed.contains("1"));

        let bare = get_wishlist()
            .decode(json!([{ "id": 2, "name": "Rug", "price": 9 }]))
            .unwrap();
        assert_eq!(bare.len(), 1);

        let empty = get_wishlist().decode(json!({ "data": null })).unwrap();
        assert!(empty.is_empty());
    }
}
