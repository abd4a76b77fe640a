//! # Authentication
//!
//! Guards the `/api` routes. A request is accepted when it carries either an
//! API key (in the configured header) whose SHA-256 digest matches one of the
//! configured hashes, or an HS256 bearer JWT signed with the configured
//! secret. Development profiles without any authentication configured let
//! requests through as anonymous.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::config::AppConfig;
use crate::error::{ApiError, unauthorized};
use crate::server::AppState;

/// How the caller was authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    ApiKey,
    Jwt,
    Anonymous,
}

/// Authenticated caller, attached to request extensions by [`auth_middleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub subject: String,
    pub method: AuthMethod,
}

/// Claims read from bearer tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub exp: Option<usize>,
}

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.config)
    }
}

/// Authentication middleware for the unavailability API.
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = authenticate(&config, request.headers())?;
    tracing::debug!(subject = %identity.subject, method = ?identity.method, "authenticated request");

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Resolve the caller from request headers.
///
/// An API key, when present, is checked first; a bearer token is only
/// considered when no API key header was sent.
pub fn authenticate(config: &AppConfig, headers: &HeaderMap) -> Result<CallerIdentity, ApiError> {
    if !config.auth_configured() {
        return Ok(CallerIdentity {
            subject: "anonymous".to_string(),
            method: AuthMethod::Anonymous,
        });
    }

    if let Some(value) = headers.get(config.api_key_header.as_str()) {
        let key = value
            .to_str()
            .map_err(|_| unauthorized(Some("Invalid API key header")))?;
        return verify_api_key(config, key);
    }

    let Some(value) = headers.get(AUTHORIZATION) else {
        return Err(unauthorized(Some("Missing API key or Authorization header")));
    };
    let token = value
        .to_str()
        .map_err(|_| unauthorized(Some("Invalid Authorization header")))?
        .strip_prefix("Bearer ")
        .ok_or_else(|| unauthorized(Some("Authorization header must use Bearer scheme")))?;

    verify_jwt(config, token.trim())
}

/// Lowercase hex SHA-256 digest of an API key.
pub fn hash_api_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

fn verify_api_key(config: &AppConfig, key: &str) -> Result<CallerIdentity, ApiError> {
    let digest = hash_api_key(key);

    let matched = config.api_key_hashes.iter().any(|configured| {
        ConstantTimeEq::ct_eq(
            digest.as_bytes(),
            configured.to_ascii_lowercase().as_bytes(),
        )
        .into()
    });

    if matched {
        Ok(CallerIdentity {
            subject: format!("api-key:{}", &digest[..8]),
            method: AuthMethod::ApiKey,
        })
    } else {
        Err(unauthorized(Some("Invalid API key")))
    }
}

fn verify_jwt(config: &AppConfig, token: &str) -> Result<CallerIdentity, ApiError> {
    let Some(secret) = config.jwt_secret.as_deref() else {
        return Err(unauthorized(Some("Bearer tokens are not accepted")));
    };

    let mut validation = Validation::new(Algorithm::HS256);
    if config.jwt_ignore_expiration {
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
    }

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|err| {
        tracing::debug!(error = %err, "rejected bearer token");
        unauthorized(Some("Invalid bearer token"))
    })?;

    Ok(CallerIdentity {
        subject: data.claims.sub.unwrap_or_else(|| "jwt".to_string()),
        method: AuthMethod::Jwt,
    })
}

impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .ok_or_else(|| unauthorized(Some("Authentication required")))
    }
}
