//! Payments (`/payments`)

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Id, de_id, de_number, de_opt_id};
use crate::envelope::{Paginated, decode_list};
use crate::errors::ApiResult;
use crate::mutation::MutationEndpoint;
use crate::query::QueryEndpoint;
use crate::tags::{Tag, TagType};
use crate::transport::ApiRequest;

pub const PAYMENTS_PATH: &str = "/payments";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    #[serde(deserialize_with = "de_id", alias = "_id")]
    pub id: Id,
    #[serde(default, deserialize_with = "de_opt_id", alias = "orderId")]
    pub order_id: Option<Id>,
    #[serde(deserialize_with = "de_number")]
    pub amount: f64,
    #[serde(default)]
    pub method: Option<String>,
    pub status: PaymentStatus,
    #[serde(default, alias = "transactionId")]
    pub transaction_id: Option<String>,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PaymentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePayment {
    #[serde(rename = "orderId")]
    pub order_id: Id,
    pub amount: f64,
    pub method: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentStatusChange {
    #[serde(skip)]
    pub id: Id,
    pub status: PaymentStatus,
}

fn decode_payments(body: Value) -> ApiResult<Paginated<Payment>> {
    decode_list(body, &["payments"])
}

pub fn get_payments() -> QueryEndpoint<PaymentFilter, Paginated<Payment>> {
    QueryEndpoint::new("getPayments", |filter: &PaymentFilter| {
        ApiRequest::get(PAYMENTS_PATH).with_query(filter)
    })
    .decode_with(decode_payments)
    .provides_tags(&[TagType::Payment])
}

pub fn get_payment() -> QueryEndpoint<Id, Payment> {
    QueryEndpoint::new("getPayment", |id: &Id| {
        Ok(ApiRequest::get(format!("{PAYMENTS_PATH}/{id}")))
    })
    .provides_with(|id: &Id, _: Option<&Payment>| vec![Tag::id(TagType::Payment, id)])
}

/// A payment moves its order forward, so order views refresh as well
pub fn create_payment() -> MutationEndpoint<CreatePayment, Payment> {
    MutationEndpoint::new("createPayment", |payment: &CreatePayment| {
        ApiRequest::post(PAYMENTS_PATH).json(payment)
    })
    .invalidates_tags(&[TagType::Payment, TagType::Order])
}

pub fn update_payment_status() -> MutationEndpoint<PaymentStatusChange, Payment> {
    MutationEndpoint::new("updatePaymentStatus", |change: &PaymentStatusChange| {
        ApiRequest::put(format!("{PAYMENTS_PATH}/{}/status", change.id)).json(change)
    })
    .invalidates_tags(&[TagType::Payment, TagType::Order])
}
