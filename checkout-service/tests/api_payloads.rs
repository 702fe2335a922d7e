use bigdecimal::BigDecimal;
use chrono::Utc;
use checkout_service::order_handlers::{
    NewOrder, OrderDetail, OrderItemView, OrderLine, OrderResponse, OrderSummary,
};
use checkout_service::product_handlers::Product;
use uuid::Uuid;

fn dec(s: &str) -> BigDecimal {
    BigDecimal::parse_bytes(s.as_bytes(), 10).unwrap()
}

#[test]
fn order_response_uses_camel_case_and_string_total() {
    let product_id = Uuid::new_v4();
    let resp = OrderResponse {
        order_id: Uuid::new_v4(),
        total: "6.48".into(),
        pickup_code: "042137".into(),
        items: vec![OrderLine {
            product_id,
            name: "Milk".into(),
            quantity: 2,
            price: 3.0,
        }],
    };
    let value = serde_json::to_value(&resp).unwrap();
    assert!(value["orderId"].is_string());
    assert_eq!(value["total"], "6.48");
    assert_eq!(value["pickupCode"], "042137");
    assert_eq!(value["items"][0]["productId"], product_id.to_string());
    assert!(value["items"][0]["price"].is_number());
}

#[test]
fn order_detail_nests_summary_and_item_names() {
    let detail = OrderDetail {
        order: OrderSummary {
            id: Uuid::new_v4(),
            total: "10.26".into(),
            pickup_code: "731004".into(),
            created_at: Utc::now(),
        },
        items: vec![OrderItemView {
            name: "Bread".into(),
            quantity: 3,
        }],
    };
    let value = serde_json::to_value(&detail).unwrap();
    assert_eq!(value["order"]["total"], "10.26");
    assert!(value["order"]["pickupCode"].is_string());
    assert!(value["order"]["createdAt"].is_string());
    assert_eq!(value["items"][0]["name"], "Bread");
    assert_eq!(value["items"][0]["quantity"], 3);
}

#[test]
fn product_list_entry_is_client_ready() {
    let product = Product {
        id: Uuid::new_v4(),
        name: "Orange".into(),
        price: dec("0.85"),
        stock: 50,
        barcode: Some("5555666677".into()),
    };
    let value = serde_json::to_value(&product).unwrap();
    assert_eq!(value["price"].as_f64().unwrap(), 0.85);
    assert_eq!(value["barcode"], "5555666677");
}

#[test]
fn new_order_round_trips_quantities_in_client_order() {
    let json = r#"{"items":[
        {"productId":"11111111-1111-1111-1111-111111111111","quantity":2},
        {"productId":"22222222-2222-2222-2222-222222222222","quantity":1}
    ]}"#;
    let order: NewOrder = serde_json::from_str(json).unwrap();
    let quantities: Vec<i32> = order.items.iter().map(|i| i.quantity).collect();
    assert_eq!(quantities, vec![2, 1]);
}
