pub mod auth;
mod contact;
mod content;
pub mod error;
mod gallery;
mod homepage;
mod missions;
mod news;
mod projects;
pub mod rate_limit;
mod settings;
mod system;
mod team;
mod upload;
pub mod validation;

pub use content::Resource;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::db::{GalleryItem, HeroSlide, Mission, NewsArticle, Project, TeamMember, Testimonial};
use crate::AppState;

/// Register list/create and get/update/delete routes for one collection
fn collection<T: Resource>(router: Router<Arc<AppState>>, path: &str) -> Router<Arc<AppState>> {
    router
        .route(
            path,
            get(content::list_items::<T>).post(content::create_item::<T>),
        )
        .route(
            &format!("{path}/:id"),
            get(content::get_item::<T>)
                .put(content::update_item::<T>)
                .delete(content::delete_item::<T>),
        )
}

/// CORS for the configured dashboard origins. `None` when everything is same-origin.
fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
    )
}

/// Unknown API paths answer in the error envelope instead of with the SPA
async fn api_not_found() -> error::ApiError {
    error::ApiError::not_found("No such API endpoint")
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let server = &state.config.server;

    let auth_routes = Router::new()
        .route(
            "/login",
            post(auth::login).layer(middleware::from_fn_with_state(
                state.clone(),
                rate_limit::rate_limit_auth,
            )),
        )
        .route("/me", get(auth::me));

    let mut api_routes = Router::new()
        .nest("/auth", auth_routes)
        // Homepage
        .route("/homepage", get(homepage::homepage))
        // Gallery by mission
        .route("/gallery/mission/:missionId", get(gallery::list_by_mission))
        // Donate page totals
        .route("/projects/summary", get(projects::funding_summary))
        // Settings
        .route(
            "/settings",
            get(settings::get_settings).post(settings::update_settings),
        )
        // Uploads
        .route(
            "/upload",
            post(upload::upload_image).layer(DefaultBodyLimit::max(
                server.max_upload_bytes + upload::MULTIPART_OVERHEAD_BYTES,
            )),
        )
        // Contact form
        .route(
            "/contact",
            post(contact::submit_contact).layer(middleware::from_fn_with_state(
                state.clone(),
                rate_limit::rate_limit_contact,
            )),
        );

    api_routes = collection::<Mission>(api_routes, "/missions");
    api_routes = collection::<GalleryItem>(api_routes, "/gallery");
    api_routes = collection::<NewsArticle>(api_routes, "/news");
    api_routes = collection::<TeamMember>(api_routes, "/team");
    api_routes = collection::<Project>(api_routes, "/projects");
    api_routes = collection::<HeroSlide>(api_routes, "/homepage/slides");
    api_routes = collection::<Testimonial>(api_routes, "/homepage/testimonials");

    let api_routes = api_routes
        .fallback(api_not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_api,
        ));

    // Serve the SPA build, falling back to index.html for client-side routes
    let index_file = server.static_dir.join("index.html");
    let serve_static =
        ServeDir::new(&server.static_dir).not_found_service(ServeFile::new(index_file));

    let mut router = Router::new()
        .route("/health", get(system::health_check))
        .nest("/api", api_routes)
        .nest_service("/uploads", ServeDir::new(&server.upload_dir))
        .fallback_service(serve_static)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = cors_layer(&server.cors_origins) {
        router = router.layer(cors);
    }

    router.with_state(state)
}
