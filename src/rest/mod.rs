// rest/mod.rs — Public REST API server.
//
// Axum HTTP server, JSON API under /api/v1. Auth is a bearer session token
// issued by register/login; every route except health and register/login
// requires one.
//
// Endpoints:
//   GET    /api/v1/health
//   POST   /api/v1/auth/register
//   POST   /api/v1/auth/login
//   POST   /api/v1/auth/logout
//   GET    /api/v1/auth/me
//   GET    /api/v1/quests/today
//   POST   /api/v1/quests/{id}/complete
//   POST   /api/v1/quests/reroll
//   POST   /api/v1/reflections
//   GET    /api/v1/reflections/mood-data
//   GET    /api/v1/achievements
//   GET    /api/v1/profile
//   PUT    /api/v1/profile/description
//   GET    /api/v1/profile/photo
//   POST   /api/v1/profile/photo
//   DELETE /api/v1/profile/photo
//   GET    /api/v1/pets
//   POST   /api/v1/pets/select
//   POST   /api/v1/pets/allocate
//   POST   /api/v1/pets/confirm
//   POST   /api/v1/pets/cancel

pub mod error;
pub mod extract;
pub mod routes;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::AppContext;

pub async fn start_rest_server(ctx: Arc<AppContext>) -> Result<()> {
    let bind = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let addr: SocketAddr = bind.parse()?;

    let router = build_router(ctx);

    info!("REST API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    // Body limit: the configured photo cap plus multipart framing headroom.
    // PhotoStore re-checks the exact byte cap, so its error is the one
    // oversized uploads actually see.
    let body_limit = ctx.config.uploads.max_bytes as usize + 64 * 1024;

    Router::new()
        // Health (no auth)
        .route("/api/v1/health", get(routes::health::health))
        // Auth
        .route("/api/v1/auth/register", post(routes::auth::register))
        .route("/api/v1/auth/login", post(routes::auth::login))
        .route("/api/v1/auth/logout", post(routes::auth::logout))
        .route("/api/v1/auth/me", get(routes::auth::me))
        // Quests
        .route("/api/v1/quests/today", get(routes::quests::today))
        .route(
            "/api/v1/quests/{id}/complete",
            post(routes::quests::complete),
        )
        .route("/api/v1/quests/reroll", post(routes::quests::reroll))
        // Reflections
        .route("/api/v1/reflections", post(routes::reflections::create))
        .route(
            "/api/v1/reflections/mood-data",
            get(routes::reflections::mood_history),
        )
        // Achievements
        .route("/api/v1/achievements", get(routes::achievements::list))
        // Profile
        .route("/api/v1/profile", get(routes::profile::profile))
        .route(
            "/api/v1/profile/description",
            put(routes::profile::set_description),
        )
        .route(
            "/api/v1/profile/photo",
            get(routes::profile::photo)
                .post(routes::profile::upload_photo)
                .delete(routes::profile::delete_photo),
        )
        // Pets
        .route("/api/v1/pets", get(routes::pets::status))
        .route("/api/v1/pets/select", post(routes::pets::select))
        .route("/api/v1/pets/allocate", post(routes::pets::allocate))
        .route("/api/v1/pets/confirm", post(routes::pets::confirm))
        .route("/api/v1/pets/cancel", post(routes::pets::cancel))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}
