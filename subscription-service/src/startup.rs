//! Application startup and lifecycle management.

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Extension, Router,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::{StoreBackend, SubscriptionConfig};
use crate::handlers::{self, admins, lookups, payment_modes, plans, subscribers, subscriptions};
use crate::middleware::admin_auth_middleware;
use crate::models::LookupKind;
use crate::services::{
    AuthService, BusinessCalendar, CatalogService, Clock, IdGenerator, KeyedLocks, MemoryStore,
    MongoStore, PlanService, PrintPdfRenderer, ReportRenderer, ReportService, Store,
    SubscriberService, SubscriptionService, SystemClock,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: SubscriptionConfig,
    pub store: Arc<dyn Store>,
    pub calendar: BusinessCalendar,
    pub catalog: CatalogService,
    pub plans: PlanService,
    pub subscriptions: SubscriptionService,
    pub subscribers: SubscriberService,
    pub reports: ReportService,
    pub auth: AuthService,
    pub renderer: Arc<dyn ReportRenderer>,
}

impl AppState {
    pub fn new(
        config: SubscriptionConfig,
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AppError> {
        let calendar = BusinessCalendar::new(config.business.offset()?, clock);
        let ids = IdGenerator::new(store.clone());
        let locks = KeyedLocks::new();

        Ok(Self {
            catalog: CatalogService::new(store.clone(), ids.clone()),
            plans: PlanService::new(store.clone(), ids.clone(), locks.clone(), calendar.clone()),
            subscriptions: SubscriptionService::new(
                store.clone(),
                ids.clone(),
                locks,
                calendar.clone(),
            ),
            subscribers: SubscriberService::new(store.clone(), ids.clone(), calendar.clone()),
            reports: ReportService::new(store.clone(), config.report.max_records),
            auth: AuthService::new(store.clone(), ids, calendar.clone()),
            renderer: Arc::new(PrintPdfRenderer),
            calendar,
            store,
            config,
        })
    }
}

/// The four lookup collections share handlers; each mount carries its kind.
fn lookup_routes(kind: LookupKind) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(lookups::list_lookups).post(lookups::create_lookup),
        )
        .route(
            "/:id",
            get(lookups::get_lookup)
                .put(lookups::replace_lookup)
                .delete(lookups::delete_lookup),
        )
        .layer(Extension(kind))
}

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/admins", get(admins::list_admins))
        .route("/admins/logout", post(admins::logout))
        .route(
            "/admins/:id",
            get(admins::get_admin)
                .put(admins::update_admin)
                .delete(admins::delete_admin),
        )
        .route("/admins/:id/activate", post(admins::activate_admin))
        .route("/admins/:id/deactivate", post(admins::deactivate_admin))
        .nest("/categories", lookup_routes(LookupKind::Category))
        .nest("/subscriber-types", lookup_routes(LookupKind::SubscriberType))
        .nest("/languages", lookup_routes(LookupKind::Language))
        .nest("/modes", lookup_routes(LookupKind::Mode))
        .route(
            "/payment-modes",
            get(payment_modes::list_payment_modes).post(payment_modes::create_payment_mode),
        )
        .route(
            "/payment-modes/:id",
            get(payment_modes::get_payment_mode)
                .put(payment_modes::replace_payment_mode)
                .delete(payment_modes::delete_payment_mode),
        )
        .route("/plans", get(plans::list_plans).post(plans::create_plan))
        .route(
            "/plans/:id",
            get(plans::get_plan)
                .put(plans::replace_plan)
                .delete(plans::delete_plan),
        )
        .route(
            "/subscribers",
            get(subscribers::list_subscribers).post(subscribers::create_subscriber),
        )
        .route("/subscribers/search", get(subscribers::search_subscribers))
        .route("/subscribers/report", get(subscribers::subscriber_report))
        .route(
            "/subscribers/report/pdf",
            get(subscribers::subscriber_report_pdf),
        )
        .route(
            "/subscribers/:id",
            get(subscribers::get_subscriber)
                .put(subscribers::replace_subscriber)
                .delete(subscribers::soft_delete_subscriber),
        )
        .route(
            "/subscribers/:id/activate",
            post(subscribers::activate_subscriber),
        )
        .route(
            "/subscriptions",
            get(subscriptions::list_subscriptions).post(subscriptions::create_subscription),
        )
        .route(
            "/subscriptions/by-subscriber/:subscriber_id",
            get(subscriptions::list_for_subscriber),
        )
        .route(
            "/subscriptions/:id",
            get(subscriptions::get_subscription)
                .put(subscriptions::replace_subscription)
                .delete(subscriptions::delete_subscription),
        )
        .route_layer(from_fn_with_state(state.clone(), admin_auth_middleware));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics))
        .route("/admins/signup", post(admins::signup))
        .route("/admins/login", post(admins::login))
        .merge(protected)
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    admin_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Connect the configured store and bind the listener.
    pub async fn build(config: SubscriptionConfig) -> Result<Self, AppError> {
        let store: Arc<dyn Store> = match config.store.backend {
            StoreBackend::Mongodb => {
                let store = MongoStore::connect(
                    config.store.mongodb.uri.expose_secret(),
                    &config.store.mongodb.database,
                )
                .await?;
                store.initialize_indexes().await.map_err(|e| {
                    tracing::error!("Failed to initialize database indexes: {}", e);
                    e
                })?;
                Arc::new(store)
            }
            StoreBackend::Memory => {
                tracing::warn!("Using the in-memory store; data is lost on shutdown");
                Arc::new(MemoryStore::new())
            }
        };

        Self::build_with(config, store, Arc::new(SystemClock)).await
    }

    /// Build on a given store and clock. Port 0 binds a random port.
    pub async fn build_with(
        config: SubscriptionConfig,
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AppError> {
        let addr: SocketAddr = config.common.bind_address().parse().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!(
                "Invalid bind address {}: {}",
                config.common.bind_address(),
                e
            ))
        })?;
        let state = AppState::new(config, store, clock)?;

        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            service = %state.config.service_name,
            port,
            "Subscription service listening"
        );

        Ok(Self {
            port,
            listener,
            router: build_router(state),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router).await
    }
}
