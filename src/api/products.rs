//! Product catalog and inventory (`/api/products`)

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Id, Update, de_id, de_number, de_opt_id, de_opt_number, split_update};
use crate::envelope::{Ack, Paginated, decode_ack, decode_list};
use crate::errors::ApiResult;
use crate::mutation::MutationEndpoint;
use crate::query::QueryEndpoint;
use crate::tags::{Tag, TagType};
use crate::transport::ApiRequest;

pub const PRODUCTS_PATH: &str = "/api/products";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(deserialize_with = "de_id", alias = "_id")]
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(deserialize_with = "de_number")]
    pub price: f64,
    #[serde(default, deserialize_with = "de_opt_number", alias = "discountPrice")]
    pub discount_price: Option<f64>,
    #[serde(default)]
    pub stock: i64,
    #[serde(default, deserialize_with = "de_opt_id", alias = "categoryId")]
    pub category_id: Option<Id>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default, alias = "isDeleted")]
    pub is_deleted: bool,
}

impl Product {
    /// The price a customer pays
    pub fn effective_price(&self) -> f64 {
        match self.discount_price {
            Some(discount) if discount > 0.0 && discount < self.price => discount,
            _ => self.price,
        }
    }

    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Catalog filters; empty fields are left out of the query string
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "minPrice")]
    pub min_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "maxPrice")]
    pub max_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "std::ops::Not::not", rename = "includeDeleted")]
    pub include_deleted: bool,
}

/// Create or full-update payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_price: Option<f64>,
    pub stock: i64,
    pub category_id: Id,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
}

/// Inventory adjustment of one product
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockUpdate {
    #[serde(skip)]
    pub id: Id,
    pub stock: i64,
}

fn decode_products(body: Value) -> ApiResult<Paginated<Product>> {
    decode_list(body, &["products"])
}

fn detail_tags(id: &Id, _: Option<&Product>) -> Vec<Tag> {
    vec![Tag::id(TagType::Product, id)]
}

fn changed_product_tags<T>(update: &Update<T>, _: Option<&Product>) -> Vec<Tag> {
    vec![Tag::of(TagType::Product), Tag::id(TagType::Product, &update.id)]
}

pub fn get_products() -> QueryEndpoint<ProductFilter, Paginated<Product>> {
    QueryEndpoint::new("getProducts", |filter: &ProductFilter| {
        ApiRequest::get(PRODUCTS_PATH).with_query(filter)
    })
    .decode_with(decode_products)
    .provides_tags(&[TagType::Product])
}

pub fn get_product() -> QueryEndpoint<Id, Product> {
    QueryEndpoint::new("getProduct", |id: &Id| {
        Ok(ApiRequest::get(format!("{PRODUCTS_PATH}/{id}")))
    })
    .provides_with(detail_tags)
}

pub fn create_product() -> MutationEndpoint<ProductInput, Product> {
    MutationEndpoint::new("createProduct", |input: &ProductInput| {
        ApiRequest::post(PRODUCTS_PATH).json(input)
    })
    .invalidates_tags(&[TagType::Product])
}

pub fn update_product() -> MutationEndpoint<Update<ProductInput>, Product> {
    MutationEndpoint::new("updateProduct", |update: &Update<ProductInput>| {
        split_update(ApiRequest::put, PRODUCTS_PATH, update)
    })
    .invalidates_with(changed_product_tags)
}

/// Soft delete
pub fn delete_product() -> MutationEndpoint<Id, Ack> {
    MutationEndpoint::new("deleteProduct", |id: &Id| {
        Ok(ApiRequest::delete(format!("{PRODUCTS_PATH}/{id}")))
    })
    .decode_with(decode_ack)
    .invalidates_tags(&[TagType::Product])
}

/// Undo a soft delete
pub fn restore_product() -> MutationEndpoint<Id, Ack> {
    MutationEndpoint::new("restoreProduct", |id: &Id| {
        Ok(ApiRequest::patch(format!("{PRODUCTS_PATH}/{id}/restore")))
    })
    .decode_with(decode_ack)
    .invalidates_tags(&[TagType::Product])
}

pub fn update_stock() -> MutationEndpoint<StockUpdate, Product> {
    MutationEndpoint::new("updateStock", |update: &StockUpdate| {
        ApiRequest::put(format!("{PRODUCTS_PATH}/{}/stock", update.id)).json(update)
    })
    .invalidates_with(|update: &StockUpdate, _: Option<&Product>| {
        vec![Tag::of(TagType::Product), Tag::id(TagType::Product, &update.id)]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::Mutation;
    use crate::query::Query;
    use serde_json::json;

    #[test]
    fn list_request_drops_empty_filters() {
        let filter = ProductFilter {
            search: Some("shoe".into()),
            page: Some(2),
            ..ProductFilter::default()
        };
        let request = get_products().request(&filter).unwrap();
        assert_eq!(request.path, PRODUCTS_PATH);
        assert_eq!(request.query_value("search"), Some("shoe"));
        assert_eq!(request.query_value("page"), Some("2"));
        assert_eq!(request.query_value("includeDeleted"), None);
        assert_eq!(request.query_value("category"), None);
    }

    #[test]
    fn decodes_collection_keyed_list() {
        let body = json!({
            "success": true,
            "data": {
                "products": [{ "_id": "p1", "name": "Lamp", "price": "25.00", "stock": 3 }],
                "page": 1, "total": 1, "totalPages": 1
            }
        });
        let list = get_products().decode(body).unwrap();
        assert_eq!(list.items[0].id, "p1");
        assert_eq!(list.items[0].price, 25.0);
        assert!(list.items[0].in_stock());
    }

    #[test]
    fn update_splits_id_and_invalidates_product() {
        let update = Update::new(
            "9",
            ProductInput {
                name: "Lamp".into(),
                price: 10.0,
                ..ProductInput::default()
            },
        );
        let request = update_product().request(&update).unwrap();
        assert_eq!(request.path, "/api/products/9");
        assert!(request.json_body().unwrap().get("id").is_none());

        let product: Product =
            serde_json::from_value(json!({ "id": 9, "name": "Lamp", "price": 10 })).unwrap();
        assert!(update_product()
            .invalidates(&update, &product)
            .contains(&Tag::of(TagType::Product)));
    }

    #[test]
    fn create_body_uses_camel_case_fields() {
        let input = ProductInput {
            name: "Lamp".into(),
            price: 40.0,
            discount_price: Some(35.0),
            category_id: "c1".into(),
            ..ProductInput::default()
        };
        let request = create_product().request(&input).unwrap();
        let body = request.json_body().unwrap();
        assert_eq!(body["discountPrice"], 35.0);
        assert_eq!(body["categoryId"], "c1");
        assert!(body.get("discount_price").is_none());
    }

    #[test]
    fn restore_uses_patch() {
        let request = restore_product().request(&"4".to_string()).unwrap();
        assert_eq!(request.method, crate::transport::Method::Patch);
        assert_eq!(request.path, "/api/products/4/restore");
    }

    #[test]
    fn effective_price_ignores_invalid_discount() {
        let product: Product = serde_json::from_value(
            json!({ "id": 1, "name": "x", "price": 100, "discount_price": 120 }),
        )
        .unwrap();
        assert_eq!(product.effective_price(), 100.0);
    }
}
