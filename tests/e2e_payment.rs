//! E2E tests for checkout, verification and influencer attribution

mod common;

use common::{RAZORPAY_KEY_ID, TestServer};
use serde_json::{Value, json};

async fn create_influencer(server: &TestServer, admin: &str, email: &str, code: &str) -> Value {
    let response = server
        .post(
            "/api/influencer/admin",
            Some(admin),
            json!({
                "name": "Dr. Kavya",
                "email": email,
                "coupon_code": code,
                "discount_percent": 10,
                "commission_percent": 20
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    response.json().await.unwrap()
}

#[tokio::test]
async fn test_create_order_for_paid_material() {
    let server = TestServer::new().await;
    let admin = server.admin_token().await;
    let (student, _) = server.student().await;
    let material = server.create_material(&admin, "Organic Chemistry", 14900, false).await;

    let order = server.create_order(&student, "material", &material).await;

    assert_eq!(order["amount"], 14900);
    assert_eq!(order["original_amount"], 14900);
    assert_eq!(order["discount_percent"], 0);
    assert_eq!(order["currency"], "INR");
    assert_eq!(order["key_id"], RAZORPAY_KEY_ID);
    assert_eq!(order["item_title"], "Organic Chemistry");
    assert!(
        order["razorpay_order_id"]
            .as_str()
            .is_some_and(|id| id.starts_with("order_TEST"))
    );
}

#[tokio::test]
async fn test_create_order_rejects_free_and_missing_items() {
    let server = TestServer::new().await;
    let admin = server.admin_token().await;
    let (student, _) = server.student().await;
    let free = server.create_material(&admin, "Free Notes", 0, true).await;

    let response = server
        .post(
            "/api/payment/create-order",
            Some(&student),
            json!({ "item_type": "material", "item_id": free }),
        )
        .await;
    assert_eq!(response.status(), 400);

    let response = server
        .post(
            "/api/payment/create-order",
            Some(&student),
            json!({ "item_type": "test", "item_id": "01HNOSUCHTEST" }),
        )
        .await;
    assert_eq!(response.status(), 404);

    let response = server
        .post(
            "/api/payment/create-order",
            None,
            json!({ "item_type": "material", "item_id": free }),
        )
        .await;
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_coupon_applies_discount() {
    let server = TestServer::new().await;
    let admin = server.admin_token().await;
    let (student, _) = server.student().await;
    let material = server.create_material(&admin, "Physics PYQs", 10000, false).await;
    create_influencer(&server, &admin, "kavya@example.com", "KAVYA10").await;

    let response = server
        .post(
            "/api/payment/create-order",
            Some(&student),
            json!({ "item_type": "material", "item_id": material, "coupon_code": "kavya10" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let order: Value = response.json().await.unwrap();
    assert_eq!(order["amount"], 9000);
    assert_eq!(order["original_amount"], 10000);
    assert_eq!(order["discount_percent"], 10);

    let response = server
        .post(
            "/api/payment/create-order",
            Some(&student),
            json!({ "item_type": "material", "item_id": material, "coupon_code": "NOPE99" }),
        )
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_coupon_lookup() {
    let server = TestServer::new().await;
    let admin = server.admin_token().await;
    let influencer = create_influencer(&server, &admin, "kavya@example.com", "KAVYA10").await;

    let response = server.get("/api/coupons/KAVYA10", None).await;
    assert_eq!(response.status(), 200);
    let coupon: Value = response.json().await.unwrap();
    assert_eq!(coupon["code"], "KAVYA10");
    assert_eq!(coupon["discount_percent"], 10);

    let response = server.get("/api/coupons/UNKNOWN1", None).await;
    assert_eq!(response.status(), 404);

    let id = influencer["id"].as_str().unwrap();
    let response = server
        .put(
            &format!("/api/influencer/admin/{id}"),
            &admin,
            json!({ "is_active": false }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let response = server.get("/api/coupons/KAVYA10", None).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_wrong_signature_creates_no_purchase() {
    let server = TestServer::new().await;
    let admin = server.admin_token().await;
    let (student, _) = server.student().await;
    let material = server.create_material(&admin, "Genetics", 4900, false).await;
    let order = server.create_order(&student, "material", &material).await;

    let response = server
        .post(
            "/api/payment/verify",
            Some(&student),
            json!({
                "razorpay_order_id": order["razorpay_order_id"],
                "razorpay_payment_id": "pay_TEST000001",
                "razorpay_signature": "deadbeef"
            }),
        )
        .await;
    assert_eq!(response.status(), 400);

    let purchases: Vec<Value> = server
        .get("/api/payment/my-purchases", Some(&student))
        .await
        .json()
        .await
        .unwrap();
    assert!(purchases.is_empty());
}

#[tokio::test]
async fn test_verify_requires_all_fields() {
    let server = TestServer::new().await;
    let (student, _) = server.student().await;

    let response = server
        .post(
            "/api/payment/verify",
            Some(&student),
            json!({ "razorpay_order_id": "order_TEST000001" }),
        )
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_verifying_twice_records_one_purchase() {
    let server = TestServer::new().await;
    let admin = server.admin_token().await;
    let (student, _) = server.student().await;
    let material = server.create_material(&admin, "Ecology", 4900, false).await;
    let order = server.create_order(&student, "material", &material).await;
    let razorpay_order_id = order["razorpay_order_id"].as_str().unwrap();

    let response = server.verify(&student, razorpay_order_id, "pay_TEST000001").await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["already_purchased"], false);
    assert_eq!(body["purchase"]["amount"], 4900);

    let response = server.verify(&student, razorpay_order_id, "pay_TEST000001").await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["already_purchased"], true);

    let purchases: Vec<Value> = server
        .get("/api/payment/my-purchases", Some(&student))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(purchases.len(), 1);
    assert_eq!(purchases[0]["item_id"], material.as_str());
    assert_eq!(purchases[0]["item_title"], "Ecology");

    // A second order for an owned item is refused
    let response = server
        .post(
            "/api/payment/create-order",
            Some(&student),
            json!({ "item_type": "material", "item_id": material }),
        )
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_cannot_verify_another_users_order() {
    let server = TestServer::new().await;
    let admin = server.admin_token().await;
    let (buyer, _) = server.student().await;
    let (other, _) = server.student().await;
    let test_id = server.create_test(&admin, "Paid Mock", 9900, false).await;
    let order = server.create_order(&buyer, "test", &test_id).await;

    let response = server
        .verify(
            &other,
            order["razorpay_order_id"].as_str().unwrap(),
            "pay_TEST000001",
        )
        .await;
    assert_eq!(response.status(), 404);

    let response = server
        .verify(&buyer, "order_UNKNOWN", "pay_TEST000001")
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_influencer_commission_is_attributed() {
    let server = TestServer::new().await;
    let admin = server.admin_token().await;
    let (student, _) = server.student().await;
    let material = server.create_material(&admin, "Botany Notes", 10000, false).await;
    let influencer = create_influencer(&server, &admin, "kavya@example.com", "KAVYA10").await;
    let influencer_id = influencer["id"].as_str().unwrap();

    let response = server
        .post(
            "/api/payment/create-order",
            Some(&student),
            json!({ "item_type": "material", "item_id": material, "coupon_code": "KAVYA10" }),
        )
        .await;
    let order: Value = response.json().await.unwrap();
    let response = server
        .verify(
            &student,
            order["razorpay_order_id"].as_str().unwrap(),
            "pay_TEST000042",
        )
        .await;
    assert_eq!(response.status(), 200);

    let orders: Vec<Value> = server
        .get(
            &format!("/api/influencer/admin/{influencer_id}/orders"),
            Some(&admin),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["order_amount"], 9000);
    assert_eq!(orders[0]["commission_amount"], 1800);

    // The influencer signs up with the same e-mail and is promoted
    let (influencer_token, influencer_user_id) =
        server.register("Dr. Kavya", "kavya@example.com").await;
    let response = server.get("/api/influencer/me", Some(&influencer_token)).await;
    assert_eq!(response.status(), 403);

    let response = server
        .patch(
            &format!("/api/users/{influencer_user_id}"),
            &admin,
            json!({ "role": "influencer" }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let response = server.get("/api/influencer/me", Some(&influencer_token)).await;
    assert_eq!(response.status(), 200);
    let dashboard: Value = response.json().await.unwrap();
    assert_eq!(dashboard["coupon_code"], "KAVYA10");
    assert_eq!(dashboard["stats"]["order_count"], 1);
    assert_eq!(dashboard["stats"]["total_sales"], 9000);
    assert_eq!(dashboard["stats"]["total_commission"], 1800);
}

#[tokio::test]
async fn test_create_order_for_owned_item_is_rejected() {
    let server = TestServer::new().await;
    let admin = server.admin_token().await;
    let (student, _) = server.student().await;
    let (other, _) = server.student().await;
    let test_id = server.create_test(&admin, "Owned Mock", 9900, false).await;

    server.purchase(&student, "test", &test_id).await;

    let response = server
        .post(
            "/api/payment/create-order",
            Some(&student),
            json!({ "item_type": "test", "item_id": test_id }),
        )
        .await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Item already purchased");

    // Another user can still buy it
    let order = server.create_order(&other, "test", &test_id).await;
    assert_eq!(order["amount"], 9900);
}

#[tokio::test]
async fn test_inactive_coupon_is_rejected_at_checkout() {
    let server = TestServer::new().await;
    let admin = server.admin_token().await;
    let (student, _) = server.student().await;
    let material = server.create_material(&admin, "Optics", 10000, false).await;
    let influencer = create_influencer(&server, &admin, "kavya@example.com", "KAVYA10").await;
    let id = influencer["id"].as_str().unwrap();

    let response = server
        .put(
            &format!("/api/influencer/admin/{id}"),
            &admin,
            json!({ "is_active": false }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let response = server
        .post(
            "/api/payment/create-order",
            Some(&student),
            json!({ "item_type": "material", "item_id": material, "coupon_code": "KAVYA10" }),
        )
        .await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid coupon code");

    // Without the coupon the full price is charged
    let order = server.create_order(&student, "material", &material).await;
    assert_eq!(order["amount"], 10000);
    assert_eq!(order["discount_percent"], 0);
}
