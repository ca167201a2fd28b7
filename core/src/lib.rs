pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;

use crate::auth::AuthState;
use crate::handlers::LedgerState;
use axum::{
    middleware,
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::init_handler,
        handlers::invoke_handler,
        auth::challenge_handler,
        auth::verify_handler
    ),
    components(schemas(
        handlers::IssueRequest, handlers::InvokeResponse, handlers::EventEnvelope,
        auth::ChallengeRequest, auth::ChallengeResponse,
        auth::VerifyRequest, auth::VerifyResponse
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "Ledger", description = "Fungible token ledger invocations"),
        (name = "Auth", description = "Ed25519 challenge login")
    ),
    info(
        title = "Token Ledger API",
        version = "0.1.0",
        description = "Issue a fungible token and move balances and allowances between principals"
    )
)]
pub struct ApiDoc;

async fn health_check() -> &'static str {
    "OK"
}

pub fn app(auth: Arc<AuthState>, ledger: Arc<LedgerState>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any);

    let protected = Router::new()
        .route("/init", post(handlers::init_handler))
        .route("/invoke/:function", post(handlers::invoke_handler))
        .route_layer(middleware::from_fn(auth::auth_middleware));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health_check))
        .route("/auth/challenge", post(auth::challenge_handler))
        .route("/auth/verify", post(auth::verify_handler))
        .merge(protected)
        .layer(Extension(auth))
        .layer(Extension(ledger))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
