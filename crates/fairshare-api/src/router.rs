use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    config::Config,
    docs,
    middleware::{auth, logging},
    routes::{blogs, chat, contact, health},
    state::AppState,
};

pub fn build_router(state: Arc<AppState>) -> Router {
    let chat_admin = Router::new()
        .route("/threads/delete-multiple", post(chat::delete_threads))
        .route("/threads/:thread_id", delete(chat::delete_thread))
        .route("/threads/:thread_id/status", put(chat::set_thread_status));

    let chat_routes = Router::new()
        .route("/thread", post(chat::create_thread))
        .route("/message", post(chat::send_message))
        .route("/history/:thread_id", get(chat::get_history))
        .route("/threads", get(chat::list_threads))
        .nest("/admin", admin_only(chat_admin, &state));

    let blog_admin = Router::new()
        .route("/posts", get(blogs::admin_list_posts).post(blogs::admin_create_post))
        .route("/posts/delete-multiple", post(blogs::admin_delete_posts))
        .route(
            "/posts/:id",
            get(blogs::admin_get_post)
                .put(blogs::admin_update_post)
                .delete(blogs::admin_delete_post),
        )
        .route("/categories", get(blogs::admin_categories));

    let blog_routes = Router::new()
        .nest("/admin", admin_only(blog_admin, &state))
        .route("/", get(blogs::list_published))
        .route("/:id", get(blogs::get_post));

    let contact_admin = Router::new()
        .route("/contacts", get(contact::admin_list_contacts))
        .route("/contacts/stats", get(contact::admin_stats))
        .route("/contacts/delete-multiple", post(contact::admin_delete_contacts))
        .route(
            "/contacts/:id",
            get(contact::admin_get_contact)
                .put(contact::admin_update_contact)
                .delete(contact::admin_delete_contact),
        )
        .route("/contacts/:id/reply", post(contact::admin_reply));

    let contact_routes = Router::new()
        .route("/test", get(contact::test_route))
        .route("/submit", post(contact::submit))
        .nest("/admin", admin_only(contact_admin, &state));

    Router::new()
        .route("/wake-up", get(health::wake_up))
        .route("/health", get(health::health_check))
        .route("/api-docs/openapi.json", get(docs::openapi_json))
        .nest("/api/chat", chat_routes)
        .nest("/api/blogs", blog_routes)
        .nest("/api/contact", contact_routes)
        .layer(middleware::from_fn(logging::log_request))
        .layer(TimeoutLayer::new(state.config.request_timeout()))
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn admin_only(routes: Router<Arc<AppState>>, state: &Arc<AppState>) -> Router<Arc<AppState>> {
    routes.route_layer(middleware::from_fn_with_state(
        state.clone(),
        auth::require_admin_key,
    ))
}

pub fn build_cors_layer(config: &Config) -> CorsLayer {
    if !config.cors.enabled {
        return CorsLayer::permissive();
    }

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    if config.cors.origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors
        .origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    cors.allow_origin(AllowOrigin::list(origins))
}
