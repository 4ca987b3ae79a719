//! SQLite database operations
//!
//! All database access goes through this module.

use chrono::{DateTime, Utc};
use sqlx::{Pool, QueryBuilder, Sqlite, SqlitePool};
use std::path::Path;

use super::models::*;
use crate::error::{AppError, conflict_on_unique};

/// Database connection pool wrapper
pub struct Database {
    pool: Pool<Sqlite>,
}

fn push_catalog_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &CatalogFilter) {
    if let Some(subject_id) = &filter.subject_id {
        builder.push(" AND subject_id = ").push_bind(subject_id.clone());
    }
    if let Some(exam) = filter.exam {
        // BOTH content is listed under either exam
        builder
            .push(" AND (exam = ")
            .push_bind(exam)
            .push(" OR exam = ")
            .push_bind(Exam::Both)
            .push(")");
    }
    if let Some(free) = filter.free {
        builder.push(" AND is_free = ").push_bind(free);
    }
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!(path = %path.display(), "Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Insert a new user
    ///
    /// # Errors
    /// `AppError::Conflict` if the e-mail is already registered
    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, name, email, password_hash, role, target_exam, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.target_exam)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Email already registered"))?;

        Ok(())
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Look up a user by (already lower-cased) e-mail
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// List users, newest first, optionally restricted to one role
    pub async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>, AppError> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM users WHERE 1 = 1");
        if let Some(role) = role {
            builder.push(" AND role = ").push_bind(role);
        }
        builder.push(" ORDER BY created_at DESC, id DESC");

        let users = builder.build_query_as::<User>().fetch_all(&self.pool).await?;
        Ok(users)
    }

    /// Update profile fields, role and password hash of a user
    pub async fn update_user(&self, user: &User) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = ?, password_hash = ?, role = ?, target_exam = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.target_exam)
        .bind(user.updated_at)
        .bind(&user.id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete a user and, by cascade, their orders, purchases and history
    pub async fn delete_user(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Subjects
    // =========================================================================

    pub async fn list_subjects(&self) -> Result<Vec<Subject>, AppError> {
        let subjects = sqlx::query_as::<_, Subject>("SELECT * FROM subjects ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(subjects)
    }

    pub async fn get_subject(&self, id: &str) -> Result<Option<Subject>, AppError> {
        let subject = sqlx::query_as::<_, Subject>("SELECT * FROM subjects WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(subject)
    }

    pub async fn insert_subject(&self, subject: &Subject) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO subjects (id, name, exam, description, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&subject.id)
        .bind(&subject.name)
        .bind(subject.exam)
        .bind(&subject.description)
        .bind(subject.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Subject already exists"))?;

        Ok(())
    }

    pub async fn update_subject(&self, subject: &Subject) -> Result<bool, AppError> {
        let result =
            sqlx::query("UPDATE subjects SET name = ?, exam = ?, description = ? WHERE id = ?")
                .bind(&subject.name)
                .bind(subject.exam)
                .bind(&subject.description)
                .bind(&subject.id)
                .execute(&self.pool)
                .await
                .map_err(|e| conflict_on_unique(e, "Subject already exists"))?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete a subject; materials and tests keep existing without a subject
    pub async fn delete_subject(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM subjects WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Materials
    // =========================================================================

    pub async fn list_materials(&self, filter: &CatalogFilter) -> Result<Vec<Material>, AppError> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM materials WHERE 1 = 1");
        push_catalog_filter(&mut builder, filter);
        builder.push(" ORDER BY created_at DESC, id DESC");

        let materials = builder
            .build_query_as::<Material>()
            .fetch_all(&self.pool)
            .await?;

        Ok(materials)
    }

    pub async fn get_material(&self, id: &str) -> Result<Option<Material>, AppError> {
        let material = sqlx::query_as::<_, Material>("SELECT * FROM materials WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(material)
    }

    pub async fn insert_material(&self, material: &Material) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO materials (
                id, title, description, subject_id, exam, price, is_free,
                pdf_url, storage_path, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&material.id)
        .bind(&material.title)
        .bind(&material.description)
        .bind(&material.subject_id)
        .bind(material.exam)
        .bind(material.price)
        .bind(material.is_free)
        .bind(&material.pdf_url)
        .bind(&material.storage_path)
        .bind(material.created_at)
        .bind(material.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Overwrite every mutable column of a material
    pub async fn update_material(&self, material: &Material) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE materials
            SET title = ?, description = ?, subject_id = ?, exam = ?, price = ?, is_free = ?,
                pdf_url = ?, storage_path = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&material.title)
        .bind(&material.description)
        .bind(&material.subject_id)
        .bind(material.exam)
        .bind(material.price)
        .bind(material.is_free)
        .bind(&material.pdf_url)
        .bind(&material.storage_path)
        .bind(material.updated_at)
        .bind(&material.id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn delete_material(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM materials WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Tests
    // =========================================================================

    pub async fn list_tests(&self, filter: &CatalogFilter) -> Result<Vec<Test>, AppError> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM tests WHERE 1 = 1");
        push_catalog_filter(&mut builder, filter);
        builder.push(" ORDER BY created_at DESC, id DESC");

        let tests = builder.build_query_as::<Test>().fetch_all(&self.pool).await?;
        Ok(tests)
    }

    pub async fn get_test(&self, id: &str) -> Result<Option<Test>, AppError> {
        let test = sqlx::query_as::<_, Test>("SELECT * FROM tests WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(test)
    }

    pub async fn insert_test(&self, test: &Test) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO tests (
                id, title, description, subject_id, exam, duration_minutes, price, is_free,
                questions, negative_marks, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&test.id)
        .bind(&test.title)
        .bind(&test.description)
        .bind(&test.subject_id)
        .bind(test.exam)
        .bind(test.duration_minutes)
        .bind(test.price)
        .bind(test.is_free)
        .bind(&test.questions)
        .bind(test.negative_marks)
        .bind(test.created_at)
        .bind(test.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update_test(&self, test: &Test) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE tests
            SET title = ?, description = ?, subject_id = ?, exam = ?, duration_minutes = ?,
                price = ?, is_free = ?, questions = ?, negative_marks = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&test.title)
        .bind(&test.description)
        .bind(&test.subject_id)
        .bind(test.exam)
        .bind(test.duration_minutes)
        .bind(test.price)
        .bind(test.is_free)
        .bind(&test.questions)
        .bind(test.negative_marks)
        .bind(test.updated_at)
        .bind(&test.id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn delete_test(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tests WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Test attempts
    // =========================================================================

    pub async fn insert_test_attempt(&self, attempt: &TestAttempt) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO test_attempts (
                id, user_id, test_id, answers, score, max_score, correct_count, wrong_count,
                started_at, submitted_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&attempt.id)
        .bind(&attempt.user_id)
        .bind(&attempt.test_id)
        .bind(&attempt.answers)
        .bind(attempt.score)
        .bind(attempt.max_score)
        .bind(attempt.correct_count)
        .bind(attempt.wrong_count)
        .bind(attempt.started_at)
        .bind(attempt.submitted_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_test_attempt(&self, id: &str) -> Result<Option<TestAttempt>, AppError> {
        let attempt = sqlx::query_as::<_, TestAttempt>("SELECT * FROM test_attempts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(attempt)
    }

    /// Attempts of one user, newest first
    pub async fn list_test_attempts_for_user(
        &self,
        user_id: &str,
        test_id: Option<&str>,
    ) -> Result<Vec<TestAttempt>, AppError> {
        let mut builder =
            QueryBuilder::<Sqlite>::new("SELECT * FROM test_attempts WHERE user_id = ");
        builder.push_bind(user_id.to_string());
        if let Some(test_id) = test_id {
            builder.push(" AND test_id = ").push_bind(test_id.to_string());
        }
        builder.push(" ORDER BY submitted_at DESC, id DESC");

        let attempts = builder
            .build_query_as::<TestAttempt>()
            .fetch_all(&self.pool)
            .await?;

        Ok(attempts)
    }

    // =========================================================================
    // Payment orders
    // =========================================================================

    pub async fn insert_payment_order(&self, order: &PaymentOrder) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO payment_orders (
                id, razorpay_order_id, user_id, item_type, item_id, amount, original_amount,
                currency, coupon_code, influencer_id, status, razorpay_payment_id,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&order.id)
        .bind(&order.razorpay_order_id)
        .bind(&order.user_id)
        .bind(order.item_type)
        .bind(&order.item_id)
        .bind(order.amount)
        .bind(order.original_amount)
        .bind(&order.currency)
        .bind(&order.coupon_code)
        .bind(&order.influencer_id)
        .bind(order.status)
        .bind(&order.razorpay_payment_id)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_payment_order_by_razorpay_id(
        &self,
        razorpay_order_id: &str,
    ) -> Result<Option<PaymentOrder>, AppError> {
        let order = sqlx::query_as::<_, PaymentOrder>(
            "SELECT * FROM payment_orders WHERE razorpay_order_id = ?",
        )
        .bind(razorpay_order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Mark an unpaid order as failed; paid orders are left untouched
    pub async fn mark_payment_order_failed(&self, id: &str) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE payment_orders SET status = ?, updated_at = ? WHERE id = ? AND status != ?",
        )
        .bind(OrderStatus::Failed)
        .bind(Utc::now())
        .bind(id)
        .bind(OrderStatus::Paid)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Purchases
    // =========================================================================

    pub async fn has_purchase(
        &self,
        user_id: &str,
        item_type: ItemType,
        item_id: &str,
    ) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM purchases WHERE user_id = ? AND item_type = ? AND item_id = ?",
        )
        .bind(user_id)
        .bind(item_type)
        .bind(item_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists > 0)
    }

    /// Record a verified payment
    ///
    /// In one transaction: marks the order paid, inserts the purchase and,
    /// when `attribution` is given, the influencer commission row.
    ///
    /// # Returns
    /// The new purchase, or `None` when the user already owned the item
    /// (the order is still marked paid, nothing else is written).
    pub async fn record_verified_payment(
        &self,
        order: &PaymentOrder,
        razorpay_payment_id: &str,
        attribution: Option<&InfluencerOrder>,
    ) -> Result<Option<Purchase>, AppError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE payment_orders SET status = ?, razorpay_payment_id = ?, updated_at = ? WHERE id = ?",
        )
        .bind(OrderStatus::Paid)
        .bind(razorpay_payment_id)
        .bind(now)
        .bind(&order.id)
        .execute(&mut *tx)
        .await?;

        let purchase = Purchase {
            id: EntityId::new().0,
            user_id: order.user_id.clone(),
            item_type: order.item_type,
            item_id: order.item_id.clone(),
            payment_order_id: Some(order.id.clone()),
            razorpay_payment_id: Some(razorpay_payment_id.to_string()),
            amount: order.amount,
            created_at: now,
        };

        let inserted = sqlx::query(
            r#"
            INSERT INTO purchases (
                id, user_id, item_type, item_id, payment_order_id, razorpay_payment_id,
                amount, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id, item_type, item_id) DO NOTHING
            "#,
        )
        .bind(&purchase.id)
        .bind(&purchase.user_id)
        .bind(purchase.item_type)
        .bind(&purchase.item_id)
        .bind(&purchase.payment_order_id)
        .bind(&purchase.razorpay_payment_id)
        .bind(purchase.amount)
        .bind(purchase.created_at)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        if inserted {
            if let Some(attribution) = attribution {
                sqlx::query(
                    r#"
                    INSERT INTO influencer_orders (
                        id, influencer_id, payment_order_id, user_id, order_amount,
                        commission_amount, created_at
                    ) VALUES (?, ?, ?, ?, ?, ?, ?)
                    ON CONFLICT(payment_order_id) DO NOTHING
                    "#,
                )
                .bind(&attribution.id)
                .bind(&attribution.influencer_id)
                .bind(&attribution.payment_order_id)
                .bind(&attribution.user_id)
                .bind(attribution.order_amount)
                .bind(attribution.commission_amount)
                .bind(attribution.created_at)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        Ok(inserted.then_some(purchase))
    }

    /// Purchases of one user with item titles, newest first
    pub async fn list_purchases_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<PurchaseWithItem>, AppError> {
        let purchases = sqlx::query_as::<_, PurchaseWithItem>(
            r#"
            SELECT p.id, p.item_type, p.item_id,
                   COALESCE(m.title, t.title) AS item_title,
                   p.amount, p.created_at
            FROM purchases p
            LEFT JOIN materials m ON p.item_type = 'material' AND m.id = p.item_id
            LEFT JOIN tests t ON p.item_type = 'test' AND t.id = p.item_id
            WHERE p.user_id = ?
            ORDER BY p.created_at DESC, p.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(purchases)
    }

    // =========================================================================
    // Material downloads
    // =========================================================================

    pub async fn insert_material_download(
        &self,
        download: &MaterialDownload,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO material_downloads (id, user_id, material_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&download.id)
        .bind(&download.user_id)
        .bind(&download.material_id)
        .bind(download.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_downloads_for_user(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<DownloadWithTitle>, AppError> {
        let downloads = sqlx::query_as::<_, DownloadWithTitle>(
            r#"
            SELECT d.id, d.material_id, m.title AS material_title, d.created_at
            FROM material_downloads d
            LEFT JOIN materials m ON m.id = d.material_id
            WHERE d.user_id = ?
            ORDER BY d.created_at DESC, d.id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(downloads)
    }

    // =========================================================================
    // Influencers
    // =========================================================================

    pub async fn list_influencers(&self) -> Result<Vec<Influencer>, AppError> {
        let influencers =
            sqlx::query_as::<_, Influencer>("SELECT * FROM influencers ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;

        Ok(influencers)
    }

    pub async fn get_influencer(&self, id: &str) -> Result<Option<Influencer>, AppError> {
        let influencer = sqlx::query_as::<_, Influencer>("SELECT * FROM influencers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(influencer)
    }

    pub async fn get_influencer_by_email(&self, email: &str) -> Result<Option<Influencer>, AppError> {
        let influencer =
            sqlx::query_as::<_, Influencer>("SELECT * FROM influencers WHERE email = ?")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;

        Ok(influencer)
    }

    /// Look up a coupon, case-insensitively
    pub async fn get_influencer_by_coupon(
        &self,
        coupon_code: &str,
    ) -> Result<Option<Influencer>, AppError> {
        let influencer = sqlx::query_as::<_, Influencer>(
            "SELECT * FROM influencers WHERE coupon_code = ? COLLATE NOCASE",
        )
        .bind(coupon_code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(influencer)
    }

    pub async fn coupon_code_exists(&self, coupon_code: &str) -> Result<bool, AppError> {
        Ok(self.get_influencer_by_coupon(coupon_code).await?.is_some())
    }

    pub async fn insert_influencer(&self, influencer: &Influencer) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO influencers (
                id, name, email, coupon_code, discount_percent, commission_percent,
                is_active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&influencer.id)
        .bind(&influencer.name)
        .bind(&influencer.email)
        .bind(&influencer.coupon_code)
        .bind(influencer.discount_percent)
        .bind(influencer.commission_percent)
        .bind(influencer.is_active)
        .bind(influencer.created_at)
        .bind(influencer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Influencer e-mail or coupon code already exists"))?;

        Ok(())
    }

    pub async fn update_influencer(&self, influencer: &Influencer) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE influencers
            SET name = ?, email = ?, coupon_code = ?, discount_percent = ?,
                commission_percent = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&influencer.name)
        .bind(&influencer.email)
        .bind(&influencer.coupon_code)
        .bind(influencer.discount_percent)
        .bind(influencer.commission_percent)
        .bind(influencer.is_active)
        .bind(influencer.updated_at)
        .bind(&influencer.id)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Influencer e-mail or coupon code already exists"))?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn delete_influencer(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM influencers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn list_influencer_orders(
        &self,
        influencer_id: &str,
    ) -> Result<Vec<InfluencerOrder>, AppError> {
        let orders = sqlx::query_as::<_, InfluencerOrder>(
            "SELECT * FROM influencer_orders WHERE influencer_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(influencer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    pub async fn influencer_stats(&self, influencer_id: &str) -> Result<InfluencerStats, AppError> {
        let stats = sqlx::query_as::<_, InfluencerStats>(
            r#"
            SELECT COUNT(*) AS order_count,
                   COALESCE(SUM(order_amount), 0) AS total_sales,
                   COALESCE(SUM(commission_amount), 0) AS total_commission
            FROM influencer_orders
            WHERE influencer_id = ?
            "#,
        )
        .bind(influencer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    pub async fn admin_stats(&self) -> Result<AdminStats, AppError> {
        async fn count(pool: &Pool<Sqlite>, sql: &str) -> Result<i64, AppError> {
            Ok(sqlx::query_scalar::<_, i64>(sql).fetch_one(pool).await?)
        }

        Ok(AdminStats {
            users: count(&self.pool, "SELECT COUNT(*) FROM users").await?,
            materials: count(&self.pool, "SELECT COUNT(*) FROM materials").await?,
            tests: count(&self.pool, "SELECT COUNT(*) FROM tests").await?,
            purchases: count(&self.pool, "SELECT COUNT(*) FROM purchases").await?,
            revenue: count(&self.pool, "SELECT COALESCE(SUM(amount), 0) FROM purchases").await?,
        })
    }

    /// Revenue recorded since `since`, in paise
    pub async fn revenue_since(&self, since: DateTime<Utc>) -> Result<i64, AppError> {
        let revenue = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(amount), 0) FROM purchases WHERE created_at >= ?",
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(revenue)
    }
}
