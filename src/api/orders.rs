//! Orders (`/orders`)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Id, de_id, de_number, de_opt_id};
use crate::envelope::{Paginated, decode_list};
use crate::errors::{ApiError, ApiResult, ErrorKind, GENERIC_ERROR_MESSAGE};
use crate::mutation::MutationEndpoint;
use crate::query::QueryEndpoint;
use crate::tags::{Tag, TagType};
use crate::transport::ApiRequest;

pub const ORDERS_PATH: &str = "/orders";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Unknown => "unknown",
        }
    }

    /// Whether the customer is offered a cancel action
    pub fn is_cancellable(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Processing)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(deserialize_with = "de_id", alias = "productId")]
    pub product_id: Id,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "de_number")]
    pub price: f64,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(deserialize_with = "de_id", alias = "_id")]
    pub id: Id,
    #[serde(default, alias = "orderNumber")]
    pub order_number: Option<String>,
    pub status: OrderStatus,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default, deserialize_with = "de_number", alias = "totalAmount")]
    pub total: f64,
    #[serde(default, deserialize_with = "de_opt_id", alias = "userId")]
    pub user_id: Option<Id>,
    #[serde(default, deserialize_with = "de_opt_id", alias = "shippingAddressId")]
    pub shipping_address_id: Option<Id>,
    #[serde(default, alias = "paymentMethod")]
    pub payment_method: Option<String>,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<String>,
}

/// Back-office order table filters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "startDate")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "endDate")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    #[serde(rename = "productId")]
    pub product_id: Id,
    pub quantity: u32,
    pub price: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateOrder {
    pub items: Vec<OrderLine>,
    #[serde(rename = "shippingAddressId")]
    pub shipping_address_id: Id,
    #[serde(rename = "paymentMethod")]
    pub payment_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    #[serde(skip)]
    pub id: Id,
    pub status: OrderStatus,
}

fn decode_orders(body: Value) -> ApiResult<Paginated<Order>> {
    decode_list(body, &["orders"])
}

fn order_and_detail(id: &Id) -> Vec<Tag> {
    vec![Tag::of(TagType::Order), Tag::id(TagType::Order, id)]
}

pub fn get_orders() -> QueryEndpoint<OrderFilter, Paginated<Order>> {
    QueryEndpoint::new("getOrders", |filter: &OrderFilter| {
        ApiRequest::get(ORDERS_PATH).with_query(filter)
    })
    .decode_with(decode_orders)
    .provides_tags(&[TagType::Order])
}

/// Orders of the signed-in customer
pub fn get_my_orders() -> QueryEndpoint<OrderFilter, Paginated<Order>> {
    QueryEndpoint::new("getMyOrders", |filter: &OrderFilter| {
        ApiRequest::get(format!("{ORDERS_PATH}/my-orders")).with_query(filter)
    })
    .decode_with(decode_orders)
    .provides_tags(&[TagType::Order])
}

pub fn get_order_details() -> QueryEndpoint<Id, Order> {
    QueryEndpoint::new("getOrderDetails", |id: &Id| {
        Ok(ApiRequest::get(format!("{ORDERS_PATH}/{id}")))
    })
    .provides_with(|id: &Id, _: Option<&Order>| vec![Tag::id(TagType::Order, id)])
}

/// Placing an order empties the cart and decrements stock server-side
pub fn create_order() -> MutationEndpoint<CreateOrder, Order> {
    MutationEndpoint::new("createOrder", |order: &CreateOrder| {
        ApiRequest::post(ORDERS_PATH).json(order)
    })
    .invalidates_tags(&[TagType::Order, TagType::Cart, TagType::Product])
}

pub fn update_order_status() -> MutationEndpoint<StatusChange, Order> {
    MutationEndpoint::new("updateOrderStatus", |change: &StatusChange| {
        ApiRequest::put(format!("{ORDERS_PATH}/{}/status", change.id)).json(change)
    })
    .invalidates_with(|change: &StatusChange, _: Option<&Order>| order_and_detail(&change.id))
}

/// Cancelling returns stock to the catalog
pub fn cancel_order() -> MutationEndpoint<Id, Order> {
    MutationEndpoint::new("cancelOrder", |id: &Id| {
        Ok(ApiRequest::put(format!("{ORDERS_PATH}/{id}/cancel")))
    })
    .invalidates_with(|id: &Id, _: Option<&Order>| {
        let mut tags = order_and_detail(id);
        tags.push(Tag::of(TagType::Product));
        tags
    })
}

/// What the order details view offers after a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Go back to the order list
    BackToOrders,
    /// Re-issue the query
    Retry,
}

/// Tailored failure panel for the order details view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureNotice {
    pub title: String,
    pub message: String,
    pub action: RecoveryAction,
}

impl FailureNotice {
    /// 403 and 404 get their own wording; everything else shows the backend
    /// message with a retry.
    pub fn for_order_error(error: &ApiError) -> Self {
        match error.kind() {
            ErrorKind::Forbidden => Self {
                title: "Access denied".to_string(),
                message: error.user_message("You don't have permission to view this order."),
                action: RecoveryAction::BackToOrders,
            },
            ErrorKind::NotFound => Self {
                title: "Order not found".to_string(),
                message: error.user_message(
                    "The order you are looking for does not exist or has been removed.",
                ),
                action: RecoveryAction::BackToOrders,
            },
            _ => Self {
                title: "Failed to load order".to_string(),
                message: error.user_message(GENERIC_ERROR_MESSAGE),
                action: RecoveryAction::Retry,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::Mutation;
    use crate::query::Query;
    use serde_json::json;

    #[test]
    fn filter_serializes_status_and_dates() {
        let filter = OrderFilter {
            status: Some(OrderStatus::Shipped),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..OrderFilter::default()
        };
        let request = get_orders().request(&filter).unwrap();
        assert_eq!(request.query_value("status"), Some("shipped"));
        assert_eq!(request.query_value("startDate"), Some("2024-01-01"));
        assert_eq!(request.query_value("endDate"), None);
    }

    #[test]
    fn status_update_invalidates_list_and_detail() {
        let change = StatusChange {
            id: "42".into(),
            status: OrderStatus::Delivered,
        };
        let request = update_order_status().request(&change).unwrap();
        assert_eq!(request.path, "/orders/42/status");
        assert_eq!(request.json_body(), Some(&json!({ "status": "delivered" })));

        let order: Order =
            serde_json::from_value(json!({ "id": 42, "status": "delivered" })).unwrap();
        let tags = update_order_status().invalidates(&change, &order);
        assert_eq!(
            tags,
            vec![Tag::of(TagType::Order), Tag::id(TagType::Order, "42")]
        );
    }

    #[test]
    fn unknown_status_does_not_fail_decoding() {
        let order: Order =
            serde_json::from_value(json!({ "_id": "1", "status": "on-hold" })).unwrap();
        assert_eq!(order.status, OrderStatus::Unknown);
    }

    #[test]
    fn failure_notice_distinguishes_forbidden_and_missing() {
        let forbidden = ApiError::Http {
            status: 403,
            data: json!({}),
        };
        let notice = FailureNotice::for_order_error(&forbidden);
        assert_eq!(notice.title, "Access denied");
        assert_eq!(notice.action, RecoveryAction::BackToOrders);

        let missing = ApiError::Http {
            status: 404,
            data: json!({ "message": "Order 9 not found" }),
        };
        let notice = FailureNotice::for_order_error(&missing);
        assert_eq!(notice.title, "Order not found");
        assert_eq!(notice.message, "Order 9 not found");

        let offline = FailureNotice::for_order_error(&ApiError::Fetch(String::new()));
        assert_eq!(offline.action, RecoveryAction::Retry);
        assert_eq!(offline.message, GENERIC_ERROR_MESSAGE);
    }
}
