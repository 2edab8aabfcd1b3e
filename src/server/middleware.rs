//! Middleware and extractors for authorization, logging, and CORS

use std::marker::PhantomData;
use std::time::Instant;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::{info, warn};

use crate::auth::{check_permissions, AuthError, Claims, Permission};
use crate::server::state::ServerState;

/// Extractor that admits a request only if its bearer token grants `P`.
///
/// A handler taking `Authorized<PostDrinks>` cannot run without a verified
/// token carrying `post:drinks`; the decoded claims ride along.
pub struct Authorized<P: Permission> {
    pub claims: Claims,
    _permission: PhantomData<P>,
}

impl<P: Permission> Authorized<P> {
    pub fn into_claims(self) -> Claims {
        self.claims
    }
}

#[async_trait]
impl<P: Permission> FromRequestParts<ServerState> for Authorized<P> {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .map(|v| v.to_str().map_err(|_| AuthError::MalformedHeader))
            .transpose()?;

        let claims = match state.verifier.verify_header(header).await {
            Ok(claims) => claims,
            Err(e) => {
                warn!("Rejected {} {}: {}", parts.method, parts.uri, e);
                return Err(e);
            }
        };
        check_permissions(P::SCOPE, &claims)?;

        Ok(Self {
            claims,
            _permission: PhantomData,
        })
    }
}

/// Request logging middleware
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    if status.is_client_error() || status.is_server_error() {
        warn!("{} {} {} ({:?})", method, uri, status, duration);
    } else {
        info!("{} {} {} ({:?})", method, uri, status, duration);
    }

    response
}

/// CORS middleware configuration
pub fn cors_layer(config: &crate::server::state::CorsConfig) -> tower_http::cors::CorsLayer {
    use axum::http::{HeaderValue, Method};
    use tower_http::cors::{Any, CorsLayer};

    let mut cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .max_age(std::time::Duration::from_secs(config.max_age));

    if config.allowed_origins.iter().any(|o| o == "*") {
        // Never allow credentials with wildcard
        cors = cors.allow_origin(Any).allow_credentials(false);
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.parse::<HeaderValue>().ok())
            .collect();
        cors = cors
            .allow_origin(origins)
            .allow_credentials(config.allow_credentials);
    }

    cors
}
