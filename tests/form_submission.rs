mod support;

use serde_json::json;
use storefront_provider::api::cart::CartItem;
use storefront_provider::api::categories;
use storefront_provider::api::{PageParams, Update};
use storefront_provider::checkout::{
    CheckoutDetails, CheckoutStaging, MemoryStore, place_order,
};
use storefront_provider::errors::{ApiError, CheckoutError, SubmitError};
use storefront_provider::prelude::*;
use storefront_provider::transport::{Method, RequestBody};
use storefront_provider::validation::CategoryForm;
use support::{FakeTransport, client_with, ok};

#[tokio::test]
async fn blank_category_name_blocks_submission() {
    let transport = FakeTransport::new();
    let client = client_with(&transport);
    let mut form = FormState::new(CategoryForm);
    form.set_field("name", "");

    let result = form.submit(&client, &categories::create_category()).await;

    let errors = match result {
        Err(SubmitError::Invalid(errors)) => errors,
        other => panic!("expected a validation failure, got {other:?}"),
    };
    assert_eq!(errors["name"], "Category name is required");
    assert_eq!(form.error("name"), Some("Category name is required"));
    assert!(!form.is_submitting());
    assert_eq!(transport.total_calls(), 0);
}

#[tokio::test]
async fn untouched_required_field_is_caught_at_submit() {
    let transport = FakeTransport::new();
    let client = client_with(&transport);
    let mut form = FormState::new(CategoryForm);
    form.set_field("description", "Seasonal decorations");
    form.blur("description");

    let result = form.submit(&client, &categories::create_category()).await;
    assert!(matches!(result, Err(SubmitError::Invalid(_))));
    assert_eq!(transport.total_calls(), 0);
}

#[tokio::test]
async fn valid_category_is_created_and_list_refreshed() {
    let transport = FakeTransport::new();
    transport.respond(Method::Get, "/categories", ok(json!({ "categories": [] })));
    transport.respond(
        Method::Post,
        "/categories",
        ok(json!({ "_id": "cat1", "name": "Home & Garden" })),
    );
    let client = client_with(&transport);

    let mut list = client.subscribe(categories::get_categories(), PageParams::default());
    list.settled().await;

    let mut form = FormState::new(CategoryForm);
    form.set_field("name", "Home & Garden");
    let created = form
        .submit(&client, &categories::create_category())
        .await
        .unwrap();
    assert_eq!(created.id, "cat1");

    let requests = transport.requests();
    let post = requests
        .iter()
        .find(|request| request.method == Method::Post)
        .unwrap();
    assert_eq!(
        post.body,
        RequestBody::Json(json!({ "name": "Home & Garden", "description": "" }))
    );

    list.settled().await;
    assert_eq!(transport.calls(Method::Get, "/categories"), 2);
}

#[tokio::test]
async fn backend_rejection_surfaces_its_message() {
    let transport = FakeTransport::new();
    transport.respond_once(
        Method::Put,
        "/categories/cat1",
        std::time::Duration::ZERO,
        Err(ApiError::Http {
            status: 409,
            data: json!({ "message": "Category name already exists" }),
        }),
    );
    let client = client_with(&transport);

    let mut form = FormState::new(CategoryForm);
    form.set_field("name", "Kitchen");
    let result = form
        .submit_with(&client, &categories::update_category(), |input| {
            Update::new("cat1", input)
        })
        .await;

    let error = match result {
        Err(SubmitError::Api(error)) => error,
        other => panic!("expected a backend error, got {other:?}"),
    };
    assert_eq!(
        error.user_message(storefront_provider::errors::GENERIC_ERROR_MESSAGE),
        "Category name already exists"
    );
    assert!(!form.is_submitting());
}

fn cart_item(id: &str, product_id: &str, price: f64, quantity: u32) -> CartItem {
    serde_json::from_value(json!({
        "_id": id,
        "productId": product_id,
        "name": product_id,
        "price": price,
        "quantity": quantity,
    }))
    .unwrap()
}

#[tokio::test]
async fn placing_an_order_clears_staging() {
    let transport = FakeTransport::new();
    transport.respond(
        Method::Post,
        "/orders",
        ok(json!({ "_id": "o1", "status": "pending", "items": [], "totalAmount": 25 })),
    );
    let client = client_with(&transport);
    let staging = CheckoutStaging::new(MemoryStore::new());
    staging
        .stage_cart_items(&[cart_item("i1", "p1", 10.0, 2), cart_item("i2", "p2", 5.0, 1)])
        .unwrap();
    assert_eq!(staging.subtotal().unwrap(), 25.0);

    let details = CheckoutDetails {
        shipping_address_id: "addr1".to_string(),
        payment_method: "cod".to_string(),
        notes: None,
    };
    let order = place_order(&client, &staging, details).await.unwrap();
    assert_eq!(order.id, "o1");
    assert!(staging.load().unwrap().is_empty());

    let requests = transport.requests();
    let RequestBody::Json(body) = &requests[0].body else {
        panic!("order must be sent as JSON");
    };
    assert_eq!(body["items"][0]["productId"], "p1");
    assert_eq!(body["items"][0]["quantity"], 2);
    assert_eq!(body["shippingAddressId"], "addr1");
}

#[tokio::test]
async fn failed_order_keeps_staged_items() {
    let transport = FakeTransport::new();
    let client = client_with(&transport);
    let staging = CheckoutStaging::new(MemoryStore::new());
    staging.stage_cart_items(&[cart_item("i1", "p1", 10.0, 1)]).unwrap();

    let result = place_order(&client, &staging, CheckoutDetails::default()).await;
    assert!(matches!(result, Err(CheckoutError::Api(_))));
    assert_eq!(staging.load().unwrap().len(), 1);
}

#[tokio::test]
async fn empty_staging_sends_nothing() {
    let transport = FakeTransport::new();
    let client = client_with(&transport);
    let staging = CheckoutStaging::new(MemoryStore::new());

    let result = place_order(&client, &staging, CheckoutDetails::default()).await;
    assert!(matches!(result, Err(CheckoutError::NothingStaged)));
    assert_eq!(transport.total_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn abandoned_submission_does_not_lock_the_form() {
    let transport = FakeTransport::new();
    transport.respond_once(
        Method::Post,
        "/categories",
        std::time::Duration::from_secs(5),
        Ok(ok(json!({ "_id": "cat1", "name": "Garden" }))),
    );
    let client = client_with(&transport);
    let mut form = FormState::new(CategoryForm);
    form.set_field("name", "Garden");

    let abandoned = tokio::time::timeout(
        std::time::Duration::from_millis(10),
        form.submit(&client, &categories::create_category()),
    )
    .await;
    assert!(abandoned.is_err());
    assert!(!form.is_submitting());

    transport.respond(
        Method::Post,
        "/categories",
        ok(json!({ "_id": "cat2", "name": "Garden" })),
    );
    let created = form
        .submit(&client, &categories::create_category())
        .await
        .unwrap();
    assert_eq!(created.id, "cat2");
    assert_eq!(transport.calls(Method::Post, "/categories"), 2);
}
