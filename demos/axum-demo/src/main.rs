use std::collections::HashMap;

use axum::{
    extract::{Path, Request},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Extension, Router,
};
use jsonwebtoken::DecodingKey;
use log::info;
use tokio::signal;
use tower::ServiceBuilder;
use tower_jwt_auth::{
    claims::VerifiedToken, context::PathParams, middleware::JwtAuth, settings::AuthSettings,
};

#[tokio::main]
async fn main() {
    env_logger::init();

    let settings = match std::env::var("AUTH_SETTINGS") {
        Ok(json) => serde_json::from_str::<AuthSettings>(&json).expect("Invalid AUTH_SETTINGS"),
        Err(_) => AuthSettings::default(),
    };
    let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| "secret".to_owned());

    let jwt_auth = <JwtAuth>::builder()
        .signing_key(DecodingKey::from_secret(secret.as_bytes()))
        .settings(settings)
        .skipper(|parts| parts.uri.path() == "/health")
        .build()
        .expect("Failed to build JWT middleware");

    // Path parameters must be visible to the middleware for `param:` lookups.
    let by_path = Router::new()
        .route("/tokens/{jwt}", get(root))
        .route_layer(jwt_auth.into_layer())
        .route_layer(middleware::from_fn(path_params));

    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(|| async { StatusCode::NO_CONTENT }))
        .layer(ServiceBuilder::new().layer(jwt_auth.into_layer()))
        .merge(by_path);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    info!("Running axum on port: 3000");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();
}

async fn path_params(
    Path(params): Path<HashMap<String, String>>,
    mut request: Request,
    next: Next,
) -> Response {
    request
        .extensions_mut()
        .insert(params.into_iter().collect::<PathParams>());
    next.run(request).await
}

async fn root(token: Extension<VerifiedToken>) -> Result<(StatusCode, String), StatusCode> {
    let name = token
        .claim("name")
        .or_else(|| token.claim("sub"))
        .and_then(|value| value.as_str())
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok((StatusCode::OK, format!("Hello, {}", name)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
