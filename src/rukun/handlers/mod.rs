//! HTTP handlers. Each one extracts input, calls [`AuthService`](crate::auth::AuthService)
//! and renders the result through the shared envelope.

pub mod admin;
pub mod health;
pub mod resident;

use anyhow::Context;
use axum::{
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::Serialize;

use crate::auth::{
    error::AuthError,
    types::{MessageResponse, Reply},
};

pub(crate) const MISSING_ATTRIBUTE: &str = "Missing attribute";
pub(crate) const MISSING_BEARER: &str = "Missing bearer token";
pub(crate) const REGISTER_SUCCESS: &str = "Register success. please log in";
pub(crate) const LOGOUT_SUCCESS: &str = "Logout success";
const NOT_FOUND: &str = "The page or resource you're looking for could not be found.";

/// Token from an `Authorization: Bearer <token>` header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

pub(crate) fn require_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    bearer_token(headers).ok_or_else(|| AuthError::unauthorized(MISSING_BEARER))
}

/// 200 envelope carrying `data`.
pub(crate) fn ok<T: Serialize>(data: &T) -> Result<Reply, AuthError> {
    let data = serde_json::to_value(data).context("failed to serialize response")?;
    Ok(Reply::ok(data))
}

pub(crate) fn message(text: &str) -> Result<Reply, AuthError> {
    ok(&MessageResponse {
        message: text.to_string(),
    })
}

// axum handler for /
pub async fn root() -> impl IntoResponse {
    message("Welcome to Rukun API")
}

pub async fn fallback() -> impl IntoResponse {
    Reply::error(StatusCode::NOT_FOUND, NOT_FOUND)
}
