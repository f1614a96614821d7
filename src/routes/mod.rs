use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::handlers::{admin, auth, hospitals, reservations, users};
use crate::middleware::auth::{auth_middleware, require_admin, require_patient};
use crate::middleware::rate_limit::{create_patient_governor, create_public_governor};
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    let public_governor = create_public_governor();
    let patient_governor = create_patient_governor();

    // Public routes (IP rate-limited)
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/admin/login", post(auth::admin_login))
        .layer(public_governor.clone());

    // Hospital directory is readable without authentication
    let directory_routes = Router::new()
        .route("/hospitals", get(hospitals::list_hospitals))
        .route("/hospitals/search", get(hospitals::search_hospitals))
        .route("/hospitals/search", post(hospitals::search_hospitals_post))
        .layer(public_governor);

    // Profile routes (requires auth, any role)
    let user_routes = Router::new()
        .route("/me", get(users::me))
        .route("/update", put(users::update_user))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Reservation routes (requires auth + patient role)
    let reservation_routes = Router::new()
        .route("/", post(reservations::create_reservation))
        .route("/", get(reservations::my_reservations))
        .route("/active", get(reservations::my_active_reservations))
        .route("/{id}", get(reservations::reservation_detail))
        .route("/{id}", put(reservations::update_reservation))
        .route("/{id}/cancel", post(reservations::cancel_reservation))
        .layer(patient_governor)
        .layer(middleware::from_fn(require_patient))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Admin routes (requires auth + admin role)
    let admin_routes = Router::new()
        .route("/reservations", get(admin::list_all_reservations))
        .route(
            "/reservations/{id}/status",
            put(admin::update_reservation_status),
        )
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", directory_routes)
        .nest("/api/users", user_routes)
        .nest("/api/reservations", reservation_routes)
        .nest("/api/admin", admin_routes)
        .with_state(state)
}
