//! `/v1/admin/*`: administrator registration, login and token lifecycle.

use axum::{extract::Extension, http::HeaderMap, Json};
use std::sync::Arc;
use tracing::instrument;

use super::{message, ok, require_bearer, LOGOUT_SUCCESS, MISSING_ATTRIBUTE, REGISTER_SUCCESS};
use crate::auth::{
    account::{AccountClass, AccountKind},
    error::AuthError,
    service::AuthService,
    storage::Store,
    types::{required, AccessTokenResponse, AdminRegisterRequest, Envelope, LoginRequest, Reply},
};

#[utoipa::path(
    post,
    path = "/v1/admin/register",
    request_body = AdminRegisterRequest,
    responses(
        (status = 200, description = "Administrator registered", body = Envelope),
        (status = 400, description = "Missing attribute or invalid username/password", body = Envelope),
        (status = 409, description = "Username already exists", body = Envelope),
        (status = 500, description = "Internal server error", body = Envelope),
    ),
    tag = "admin"
)]
#[instrument(skip(service, payload))]
pub async fn register<S: Store>(
    service: Extension<Arc<AuthService<S>>>,
    payload: Option<Json<AdminRegisterRequest>>,
) -> Result<Reply, AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::validation(MISSING_ATTRIBUTE));
    };
    let (Some(username), Some(password)) = (
        required(request.username.as_ref()),
        required(request.password.as_ref()),
    ) else {
        return Err(AuthError::validation(MISSING_ATTRIBUTE));
    };

    service
        .register(
            AccountClass::Admin {
                username: username.to_string(),
            },
            password,
        )
        .await?;

    message(REGISTER_SUCCESS)
}

#[utoipa::path(
    post,
    path = "/v1/admin/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Access and refresh tokens", body = Envelope),
        (status = 400, description = "Missing attribute", body = Envelope),
        (status = 401, description = "Invalid identifier or password", body = Envelope),
    ),
    tag = "admin"
)]
#[instrument(skip(service, payload))]
pub async fn login<S: Store>(
    service: Extension<Arc<AuthService<S>>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<Reply, AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::validation(MISSING_ATTRIBUTE));
    };
    let (Some(username), Some(password)) = (
        required(request.identifier.as_ref()),
        required(request.password.as_ref()),
    ) else {
        return Err(AuthError::validation(MISSING_ATTRIBUTE));
    };

    ok(&service.login(AccountKind::Admin, username, password).await?)
}

#[utoipa::path(
    post,
    path = "/v1/admin/token",
    responses(
        (status = 200, description = "New access token", body = Envelope),
        (status = 401, description = "Missing, invalid, expired or revoked refresh token", body = Envelope),
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
#[instrument(skip(service, headers))]
pub async fn token<S: Store>(
    service: Extension<Arc<AuthService<S>>>,
    headers: HeaderMap,
) -> Result<Reply, AuthError> {
    let refresh_token = require_bearer(&headers)?;
    let access_token = service.refresh(AccountKind::Admin, refresh_token).await?;

    ok(&AccessTokenResponse { access_token })
}

#[utoipa::path(
    post,
    path = "/v1/admin/logout",
    responses(
        (status = 200, description = "Refresh token revoked", body = Envelope),
        (status = 401, description = "Missing or invalid refresh token", body = Envelope),
        (status = 404, description = "Token not found", body = Envelope),
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
#[instrument(skip(service, headers))]
pub async fn logout<S: Store>(
    service: Extension<Arc<AuthService<S>>>,
    headers: HeaderMap,
) -> Result<Reply, AuthError> {
    service
        .logout(AccountKind::Admin, require_bearer(&headers)?)
        .await?;

    message(LOGOUT_SUCCESS)
}
