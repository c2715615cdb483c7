#![cfg(feature = "hooks")]

mod support;

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use dioxus::prelude::*;
use dioxus_core::NoOpMutations;
use futures::FutureExt;
use serde_json::json;
use storefront_provider::api::cart::{self, AddToCart, Cart};
use storefront_provider::global;
use storefront_provider::prelude::{ClientConfig, QueryState, use_query};
use storefront_provider::transport::Method;
use support::{FakeTransport, ok};
use tokio::{task::yield_now, time::sleep};

type Recorder = Rc<RefCell<Vec<QueryState<Cart>>>>;

#[derive(Props, Clone, PartialEq)]
struct BadgeProps {
    recorder: Recorder,
}

#[allow(non_snake_case)]
fn CartBadge(props: BadgeProps) -> Element {
    let state = use_query(cart::get_cart(), ());
    let record = props.recorder.clone();
    use_effect(move || {
        record.borrow_mut().push(state.read().clone());
    });
    rsx!(span {})
}

#[derive(Props, Clone, PartialEq)]
struct HeaderProps {
    recorder_a: Recorder,
    recorder_b: Recorder,
}

#[allow(non_snake_case)]
fn Header(props: HeaderProps) -> Element {
    rsx! {
        CartBadge { recorder: props.recorder_a.clone() }
        CartBadge { recorder: props.recorder_b.clone() }
    }
}

fn block_on_test(fut: impl Future<Output = ()>) {
    tokio::runtime::Runtime::new()
        .expect("tokio runtime")
        .block_on(fut);
}

fn cart_with(quantity: u32) -> serde_json::Value {
    let items = if quantity == 0 {
        json!([])
    } else {
        json!([{ "_id": "i1", "productId": "p1", "price": 10, "quantity": quantity }])
    };
    ok(json!({ "_id": "c1", "items": items }))
}

async fn pump_until(vdom: &mut VirtualDom, done: impl Fn() -> bool) {
    let mut mutations = NoOpMutations;
    for _ in 0..100 {
        while vdom.wait_for_work().now_or_never().is_some() {
            vdom.render_immediate(&mut mutations);
        }
        if done() {
            return;
        }
        yield_now().await;
        sleep(Duration::from_millis(5)).await;
    }
}

fn last_count(recorder: &Recorder) -> Option<usize> {
    recorder
        .borrow()
        .last()
        .and_then(|state| state.data().map(Cart::item_count))
}

#[test]
fn badges_share_one_fetch_and_follow_invalidation() {
    block_on_test(async {
        let transport = FakeTransport::new();
        transport.respond(Method::Get, "/api/carts", cart_with(0));
        transport.respond(Method::Post, "/api/carts/items", ok(json!({})));
        let client = global::init_with_transport(
            ClientConfig::new("http://localhost:5000"),
            transport.clone(),
        )
        .expect("global client");

        let recorder_a: Recorder = Rc::new(RefCell::new(Vec::new()));
        let recorder_b: Recorder = Rc::new(RefCell::new(Vec::new()));
        let mut vdom = VirtualDom::new_with_props(
            Header,
            HeaderProps {
                recorder_a: recorder_a.clone(),
                recorder_b: recorder_b.clone(),
            },
        );
        vdom.rebuild_in_place();

        pump_until(&mut vdom, || {
            last_count(&recorder_a) == Some(0) && last_count(&recorder_b) == Some(0)
        })
        .await;
        assert_eq!(last_count(&recorder_a), Some(0));
        assert_eq!(last_count(&recorder_b), Some(0));
        assert_eq!(
            transport.calls(Method::Get, "/api/carts"),
            1,
            "both badges should share a single request"
        );

        transport.respond(Method::Get, "/api/carts", cart_with(3));
        client
            .mutate(
                &cart::add_to_cart(),
                AddToCart {
                    product_id: "p1".to_string(),
                    quantity: 3,
                },
            )
            .await
            .expect("add to cart");

        pump_until(&mut vdom, || {
            last_count(&recorder_a) == Some(3) && last_count(&recorder_b) == Some(3)
        })
        .await;
        assert_eq!(last_count(&recorder_a), Some(3));
        assert_eq!(last_count(&recorder_b), Some(3));
        assert_eq!(transport.calls(Method::Get, "/api/carts"), 2);
    });
}
