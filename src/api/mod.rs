pub mod handlers;
pub mod middleware;
pub mod multipart;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post, MethodRouter},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    services::ServeDir,
    trace::TraceLayer,
};
use std::sync::Arc;

use crate::{
    config::Settings,
    service::ServiceContext,
};
use state::AppState;

/// Room for several attachments in one submission.
const MAX_FILES_PER_REQUEST: usize = 10;

pub fn create_app(service_context: Arc<ServiceContext>, settings: Arc<Settings>) -> Router {
    let uploads_dir = settings.uploads.dir.clone();
    let uploads_prefix = settings.uploads.public_prefix.trim_end_matches('/').to_string();
    let body_limit = settings
        .uploads
        .max_file_size_bytes
        .saturating_mul(MAX_FILES_PER_REQUEST)
        .saturating_add(1024 * 1024);

    let app_state = AppState::new(service_context, settings);

    Router::new()
        // Root and health endpoints
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))

        .nest("/auth", auth_routes(app_state.clone()))
        .merge(catalog_routes(app_state.clone()))
        .merge(assignment_routes(app_state.clone()))
        .merge(messaging_routes(app_state.clone()))
        .nest("/admin", admin_routes(app_state.clone()))

        // Add state to the router
        .with_state(app_state)

        // Stored uploads are served verbatim
        .nest_service(&uploads_prefix, ServeDir::new(uploads_dir))

        // Middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn with_auth(state: &AppState, route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.route_layer(axum::middleware::from_fn_with_state(
        state.clone(),
        middleware::auth::require_auth,
    ))
}

fn with_admin(state: &AppState, route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.route_layer(axum::middleware::from_fn_with_state(
        state.clone(),
        middleware::auth::require_admin,
    ))
}

fn with_maker(state: &AppState, route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.route_layer(axum::middleware::from_fn_with_state(
        state.clone(),
        middleware::auth::require_maker,
    ))
}

fn auth_routes(_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout))
}

fn catalog_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Public reads, admin mutations
        .route(
            "/departments",
            get(handlers::departments::list)
                .merge(with_admin(&state, post(handlers::departments::create))),
        )
        .route(
            "/departments/:id",
            get(handlers::departments::get).merge(with_admin(
                &state,
                patch(handlers::departments::update).delete(handlers::departments::delete),
            )),
        )
        .route("/makers", get(handlers::makers::list_eligible))
}

fn assignment_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Seekers submit without a session
        .route(
            "/assignments",
            post(handlers::assignments::submit)
                .merge(with_auth(&state, get(handlers::assignments::list))),
        )
        .route(
            "/assignments/:id/complete",
            with_maker(&state, post(handlers::assignments::complete)),
        )
        .route(
            "/available-assignments",
            with_maker(
                &state,
                get(handlers::assignments::list_available).post(handlers::assignments::claim),
            ),
        )
        .route("/balance", with_auth(&state, get(handlers::balance::get)))
}

fn messaging_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/announcements",
            with_auth(
                &state,
                get(handlers::announcements::list).post(handlers::announcements::create),
            ),
        )
        .route(
            "/announcements/:id/read",
            with_maker(&state, patch(handlers::announcements::mark_read)),
        )
        // Anyone may file a report; only admins read and triage them
        .route(
            "/reports",
            post(handlers::reports::create)
                .merge(with_admin(&state, get(handlers::reports::list))),
        )
        .route(
            "/reports/:id",
            with_admin(&state, patch(handlers::reports::update)),
        )
}

fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/users", get(handlers::admin::list_users))
        .route(
            "/users/:id",
            patch(handlers::admin::update_user).delete(handlers::admin::delete_user),
        )
        .route("/assignments", get(handlers::admin::list_assignments))
        .route("/assignments/:id", patch(handlers::admin::update_assignment))
        .route("/ledger/audit", get(handlers::admin::ledger_audit))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_admin,
        ))
}
