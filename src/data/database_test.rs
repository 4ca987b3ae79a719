//! Database tests

use super::*;
use chrono::Utc;
use sqlx::types::Json;
use tempfile::TempDir;

/// Helper to create a test database
async fn create_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = Database::connect(&db_path).await.unwrap();
    (db, temp_dir)
}

fn test_user(email: &str) -> User {
    User {
        id: EntityId::new().0,
        name: "Asha".to_string(),
        email: email.to_string(),
        password_hash: "$argon2id$placeholder".to_string(),
        role: Role::Student,
        target_exam: Some(Exam::Neet),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn test_material(price: i64, is_free: bool) -> Material {
    Material {
        id: EntityId::new().0,
        title: "Organic Chemistry Notes".to_string(),
        description: None,
        subject_id: None,
        exam: Exam::Jee,
        price,
        is_free,
        pdf_url: None,
        storage_path: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn test_order(user: &User, material: &Material, razorpay_order_id: &str) -> PaymentOrder {
    PaymentOrder {
        id: EntityId::new().0,
        razorpay_order_id: razorpay_order_id.to_string(),
        user_id: user.id.clone(),
        item_type: ItemType::Material,
        item_id: material.id.clone(),
        amount: material.price,
        original_amount: material.price,
        currency: "INR".to_string(),
        coupon_code: None,
        influencer_id: None,
        status: OrderStatus::Created,
        razorpay_payment_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_database_connection() {
    let (_db, _temp_dir) = create_test_db().await;
}

#[tokio::test]
async fn test_user_insert_and_lookup() {
    let (db, _temp_dir) = create_test_db().await;
    let user = test_user("asha@example.com");

    db.insert_user(&user).await.unwrap();

    let by_email = db.get_user_by_email("asha@example.com").await.unwrap();
    assert_eq!(by_email.map(|u| u.id), Some(user.id.clone()));

    let by_id = db.get_user(&user.id).await.unwrap().unwrap();
    assert_eq!(by_id.role, Role::Student);
    assert_eq!(by_id.target_exam, Some(Exam::Neet));
}

#[tokio::test]
async fn test_duplicate_email_is_conflict() {
    let (db, _temp_dir) = create_test_db().await;

    db.insert_user(&test_user("dup@example.com")).await.unwrap();
    let err = db
        .insert_user(&test_user("dup@example.com"))
        .await
        .unwrap_err();

    assert!(matches!(err, crate::error::AppError::Conflict(_)));
}

#[tokio::test]
async fn test_list_users_by_role() {
    let (db, _temp_dir) = create_test_db().await;

    let mut admin = test_user("admin@example.com");
    admin.role = Role::Admin;
    db.insert_user(&admin).await.unwrap();
    db.insert_user(&test_user("s1@example.com")).await.unwrap();

    assert_eq!(db.list_users(None).await.unwrap().len(), 2);
    let admins = db.list_users(Some(Role::Admin)).await.unwrap();
    assert_eq!(admins.len(), 1);
    assert_eq!(admins[0].email, "admin@example.com");
}

#[tokio::test]
async fn test_material_filters() {
    let (db, _temp_dir) = create_test_db().await;

    let subject = Subject {
        id: EntityId::new().0,
        name: "Chemistry".to_string(),
        exam: Exam::Both,
        description: None,
        created_at: Utc::now(),
    };
    db.insert_subject(&subject).await.unwrap();

    let mut paid = test_material(49_900, false);
    paid.subject_id = Some(subject.id.clone());
    let mut free = test_material(0, true);
    free.exam = Exam::Both;
    let mut neet_only = test_material(0, true);
    neet_only.exam = Exam::Neet;
    for material in [&paid, &free, &neet_only] {
        db.insert_material(material).await.unwrap();
    }

    let all = db.list_materials(&CatalogFilter::default()).await.unwrap();
    assert_eq!(all.len(), 3);

    let by_subject = db
        .list_materials(&CatalogFilter {
            subject_id: Some(subject.id.clone()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_subject.len(), 1);
    assert_eq!(by_subject[0].id, paid.id);

    let jee = db
        .list_materials(&CatalogFilter {
            exam: Some(Exam::Jee),
            ..Default::default()
        })
        .await
        .unwrap();
    let jee_ids: Vec<_> = jee.iter().map(|m| m.id.clone()).collect();
    assert_eq!(jee.len(), 2);
    assert!(jee_ids.contains(&paid.id));
    assert!(jee_ids.contains(&free.id));

    let free_only = db
        .list_materials(&CatalogFilter {
            free: Some(true),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(free_only.len(), 2);
}

#[tokio::test]
async fn test_subject_delete_keeps_materials() {
    let (db, _temp_dir) = create_test_db().await;

    let subject = Subject {
        id: EntityId::new().0,
        name: "Physics".to_string(),
        exam: Exam::Jee,
        description: None,
        created_at: Utc::now(),
    };
    db.insert_subject(&subject).await.unwrap();

    let mut material = test_material(0, true);
    material.subject_id = Some(subject.id.clone());
    db.insert_material(&material).await.unwrap();

    assert!(db.delete_subject(&subject.id).await.unwrap());
    let material = db.get_material(&material.id).await.unwrap().unwrap();
    assert_eq!(material.subject_id, None);
}

#[tokio::test]
async fn test_test_round_trips_questions() {
    let (db, _temp_dir) = create_test_db().await;

    let test = Test {
        id: EntityId::new().0,
        title: "Mock NEET 1".to_string(),
        description: None,
        subject_id: None,
        exam: Exam::Neet,
        duration_minutes: 180,
        price: 0,
        is_free: true,
        questions: Json(vec![Question {
            prompt: "Powerhouse of the cell?".to_string(),
            options: vec!["Nucleus".to_string(), "Mitochondria".to_string()],
            correct_option: 1,
            marks: 4,
            explanation: None,
        }]),
        negative_marks: 1,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    db.insert_test(&test).await.unwrap();

    let stored = db.get_test(&test.id).await.unwrap().unwrap();
    assert_eq!(stored.questions.0, test.questions.0);
    assert_eq!(stored.negative_marks, 1);
}

#[tokio::test]
async fn test_record_verified_payment_is_idempotent() {
    let (db, _temp_dir) = create_test_db().await;

    let user = test_user("buyer@example.com");
    db.insert_user(&user).await.unwrap();
    let material = test_material(29_900, false);
    db.insert_material(&material).await.unwrap();

    let order = test_order(&user, &material, "order_A");
    db.insert_payment_order(&order).await.unwrap();

    assert!(
        !db.has_purchase(&user.id, ItemType::Material, &material.id)
            .await
            .unwrap()
    );

    let first = db
        .record_verified_payment(&order, "pay_1", None)
        .await
        .unwrap();
    assert!(first.is_some());

    let second = db
        .record_verified_payment(&order, "pay_1", None)
        .await
        .unwrap();
    assert!(second.is_none());

    assert!(
        db.has_purchase(&user.id, ItemType::Material, &material.id)
            .await
            .unwrap()
    );
    let purchases = db.list_purchases_for_user(&user.id).await.unwrap();
    assert_eq!(purchases.len(), 1);
    assert_eq!(purchases[0].item_title.as_deref(), Some("Organic Chemistry Notes"));

    let order = db
        .get_payment_order_by_razorpay_id("order_A")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Paid);
    assert_eq!(order.razorpay_payment_id.as_deref(), Some("pay_1"));
}

#[tokio::test]
async fn test_failed_mark_does_not_downgrade_paid_order() {
    let (db, _temp_dir) = create_test_db().await;

    let user = test_user("buyer2@example.com");
    db.insert_user(&user).await.unwrap();
    let material = test_material(9_900, false);
    db.insert_material(&material).await.unwrap();
    let order = test_order(&user, &material, "order_B");
    db.insert_payment_order(&order).await.unwrap();

    db.record_verified_payment(&order, "pay_2", None)
        .await
        .unwrap();
    db.mark_payment_order_failed(&order.id).await.unwrap();

    let order = db
        .get_payment_order_by_razorpay_id("order_B")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Paid);
}

#[tokio::test]
async fn test_influencer_attribution_and_stats() {
    let (db, _temp_dir) = create_test_db().await;

    let influencer = Influencer {
        id: EntityId::new().0,
        name: "Ravi".to_string(),
        email: "ravi@example.com".to_string(),
        coupon_code: "RAVI1234".to_string(),
        discount_percent: 10,
        commission_percent: 20,
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    db.insert_influencer(&influencer).await.unwrap();
    assert!(db.coupon_code_exists("ravi1234").await.unwrap());

    let user = test_user("fan@example.com");
    db.insert_user(&user).await.unwrap();
    let material = test_material(10_000, false);
    db.insert_material(&material).await.unwrap();

    let mut order = test_order(&user, &material, "order_C");
    order.amount = 9_000;
    order.coupon_code = Some(influencer.coupon_code.clone());
    order.influencer_id = Some(influencer.id.clone());
    db.insert_payment_order(&order).await.unwrap();

    let attribution = InfluencerOrder {
        id: EntityId::new().0,
        influencer_id: influencer.id.clone(),
        payment_order_id: order.id.clone(),
        user_id: user.id.clone(),
        order_amount: 9_000,
        commission_amount: 1_800,
        created_at: Utc::now(),
    };
    db.record_verified_payment(&order, "pay_3", Some(&attribution))
        .await
        .unwrap();

    let stats = db.influencer_stats(&influencer.id).await.unwrap();
    assert_eq!(
        stats,
        InfluencerStats {
            order_count: 1,
            total_sales: 9_000,
            total_commission: 1_800,
        }
    );
    assert_eq!(db.list_influencer_orders(&influencer.id).await.unwrap().len(), 1);

    let admin = db.admin_stats().await.unwrap();
    assert_eq!(admin.purchases, 1);
    assert_eq!(admin.revenue, 9_000);
}

#[tokio::test]
async fn test_downloads_history() {
    let (db, _temp_dir) = create_test_db().await;

    let user = test_user("reader@example.com");
    db.insert_user(&user).await.unwrap();
    let material = test_material(0, true);
    db.insert_material(&material).await.unwrap();

    for _ in 0..2 {
        db.insert_material_download(&MaterialDownload {
            id: EntityId::new().0,
            user_id: user.id.clone(),
            material_id: material.id.clone(),
            created_at: Utc::now(),
        })
        .await
        .unwrap();
    }

    let history = db.list_downloads_for_user(&user.id, 10).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(
        history[0].material_title.as_deref(),
        Some("Organic Chemistry Notes")
    );

    assert!(db.delete_user(&user.id).await.unwrap());
    assert!(db.list_downloads_for_user(&user.id, 10).await.unwrap().is_empty());
}
