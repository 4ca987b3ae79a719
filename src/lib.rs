//! ExamDesk - back office for a NEET/JEE study-content store
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - Auth, catalog, attempts, downloads                       │
//! │  - Payment and coupon endpoints                             │
//! │  - Admin/influencer back office                             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Checkout, entitlements, scoring, coupons                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - SQLite (sqlx)                                            │
//! │  - Moka catalog cache                                       │
//! │  - Supabase Storage, Razorpay                               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers
//! - `service`: Business logic layer
//! - `payment`: Razorpay client and signature checks
//! - `data`: Database and cache layer
//! - `storage`: Supabase Storage for material files
//! - `auth`: E-mail/password sessions
//! - `config`: Configuration management
//! - `error`: Error types

pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod payment;
pub mod service;
pub mod storage;

use std::sync::Arc;
use std::time::Duration;

/// Application state shared across all handlers
///
/// This struct is cloned for each request and contains
/// shared resources like database pool, caches, and HTTP clients.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database connection pool
    pub db: Arc<data::Database>,

    /// Catalog listing cache (volatile, TTL)
    pub catalog_cache: Arc<data::CatalogCache>,

    /// Material file storage (Supabase Storage)
    pub storage: Arc<storage::MaterialStorage>,

    /// Razorpay API client
    pub razorpay: Arc<payment::RazorpayClient>,

    /// Order creation and payment verification
    pub checkout: Arc<service::CheckoutService>,

    /// Failed sign-in throttling
    pub login_throttle: Arc<auth::LoginThrottle>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect to SQLite database (runs migrations)
    /// 2. Initialize caches
    /// 3. Build HTTP clients for Razorpay and Supabase Storage
    /// 4. Ensure the configured admin exists
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        // 1. Connect to SQLite database
        let db = Arc::new(data::Database::connect(&config.database.path).await?);
        tracing::info!("Database connected");

        // 2. Initialize caches
        let catalog_cache =
            data::CatalogCache::new(Duration::from_secs(config.cache.catalog_ttl));
        tracing::info!(ttl = config.cache.catalog_ttl, "Catalog cache initialized");

        // 3. Initialize HTTP clients
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("ExamDesk/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| error::AppError::Internal(e.into()))?;

        let storage = storage::MaterialStorage::new(&config.storage, http_client.clone());
        let razorpay = Arc::new(payment::RazorpayClient::new(
            &config.payment.razorpay,
            http_client,
        ));
        let checkout = service::CheckoutService::new(db.clone(), razorpay.clone());

        let login_throttle = auth::LoginThrottle::new(
            config.auth.login_max_attempts,
            Duration::from_secs(config.auth.login_window_seconds),
        );

        // 4. Initialize admin user
        Self::ensure_admin_user(&db, &config).await?;

        tracing::info!("Application state initialized successfully");

        Ok(Self {
            config: Arc::new(config),
            db,
            catalog_cache: Arc::new(catalog_cache),
            storage: Arc::new(storage),
            razorpay,
            checkout: Arc::new(checkout),
            login_throttle: Arc::new(login_throttle),
        })
    }

    /// Ensure admin user exists with current configuration
    ///
    /// Creates the admin when missing and promotes an existing account
    /// with the configured e-mail. The password of an existing account is
    /// left unchanged.
    async fn ensure_admin_user(
        db: &data::Database,
        config: &config::AppConfig,
    ) -> Result<(), error::AppError> {
        let Some((email, password)) = config.admin_credentials() else {
            tracing::debug!("No admin credentials configured");
            return Ok(());
        };
        let email = auth::normalize_email(email)?;

        if let Some(mut user) = db.get_user_by_email(&email).await? {
            if user.role == data::Role::Admin {
                tracing::info!(user_id = %user.id, "Admin account exists");
                return Ok(());
            }

            user.role = data::Role::Admin;
            user.updated_at = chrono::Utc::now();
            db.update_user(&user).await?;
            tracing::info!(user_id = %user.id, "Existing account promoted to admin");
            return Ok(());
        }

        tracing::info!("Creating admin account...");
        auth::password::validate_password(password)?;

        let now = chrono::Utc::now();
        let user = data::User {
            id: data::EntityId::new().0,
            name: config.admin.name.clone(),
            email,
            password_hash: auth::password::hash_password(password).await?,
            role: data::Role::Admin,
            target_exam: None,
            created_at: now,
            updated_at: now,
        };
        db.insert_user(&user).await?;

        tracing::info!(user_id = %user.id, email = %user.email, "Admin account created");
        Ok(())
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::{Router, extract::DefaultBodyLimit, middleware};
    use tower_http::{
        compression::CompressionLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
    };

    let cors_layer = build_cors_layer(&state.config.server);
    let metrics_routes = api::metrics_router::<AppState>().route_layer(middleware::from_fn_with_state(
        state.clone(),
        auth::require_admin,
    ));

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .nest("/api", api::api_router())
        .merge(metrics_routes)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(state.config.server.max_upload_bytes))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

fn build_cors_layer(server: &config::ServerConfig) -> tower_http::cors::CorsLayer {
    use axum::http::HeaderValue;
    use tower_http::cors::{Any, CorsLayer};

    if !server.protocol.eq_ignore_ascii_case("https") {
        return CorsLayer::permissive();
    }

    let allowed_origin = server.base_url();
    match HeaderValue::from_str(&allowed_origin) {
        Ok(origin) => CorsLayer::new()
            .allow_origin([origin])
            .allow_methods(Any)
            .allow_headers(Any),
        Err(error) => {
            tracing::error!(
                %error,
                origin = %allowed_origin,
                "Failed to parse CORS origin from server base URL; denying cross-origin requests"
            );
            CorsLayer::new().allow_methods(Any).allow_headers(Any)
        }
    }
}

async fn health_check() -> &'static str {
    "OK"
}
