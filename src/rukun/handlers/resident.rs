//! `/v1/user/*`: resident registration, login and token lifecycle.

use axum::{extract::Extension, http::HeaderMap, Json};
use std::sync::Arc;
use tracing::instrument;

use super::{message, ok, require_bearer, LOGOUT_SUCCESS, MISSING_ATTRIBUTE, REGISTER_SUCCESS};
use crate::auth::{
    account::{AccountClass, AccountKind},
    error::AuthError,
    service::AuthService,
    storage::Store,
    token::Claims,
    types::{
        required, AccessTokenResponse, Envelope, LoginRequest, ResidentRegisterRequest, Reply,
    },
};

#[utoipa::path(
    post,
    path = "/v1/user/register",
    request_body = ResidentRegisterRequest,
    responses(
        (status = 200, description = "Resident registered", body = Envelope),
        (status = 400, description = "Missing attribute or invalid national ID/password", body = Envelope),
        (status = 409, description = "National ID already exists", body = Envelope),
        (status = 500, description = "Internal server error", body = Envelope),
    ),
    tag = "resident"
)]
#[instrument(skip(service, payload))]
pub async fn register<S: Store>(
    service: Extension<Arc<AuthService<S>>>,
    payload: Option<Json<ResidentRegisterRequest>>,
) -> Result<Reply, AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::validation(MISSING_ATTRIBUTE));
    };

    let (Some(name), Some(password), Some(national_id), Some(rt), Some(rw)) = (
        required(request.name.as_ref()),
        required(request.password.as_ref()),
        required(request.national_id.as_ref()),
        required(request.rt.as_ref()),
        required(request.rw.as_ref()),
    ) else {
        return Err(AuthError::validation(MISSING_ATTRIBUTE));
    };

    let class = AccountClass::Resident {
        national_id: national_id.to_string(),
        name: name.to_string(),
        rt: rt.to_string(),
        rw: rw.to_string(),
    };
    service.register(class, password).await?;

    message(REGISTER_SUCCESS)
}

#[utoipa::path(
    post,
    path = "/v1/user/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Access and refresh tokens", body = Envelope),
        (status = 400, description = "Missing attribute", body = Envelope),
        (status = 401, description = "Invalid identifier or password", body = Envelope),
    ),
    tag = "resident"
)]
#[instrument(skip(service, payload))]
pub async fn login<S: Store>(
    service: Extension<Arc<AuthService<S>>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<Reply, AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::validation(MISSING_ATTRIBUTE));
    };
    let (Some(national_id), Some(password)) = (
        required(request.identifier.as_ref()),
        required(request.password.as_ref()),
    ) else {
        return Err(AuthError::validation(MISSING_ATTRIBUTE));
    };

    let pair = service
        .login(AccountKind::Resident, national_id, password)
        .await?;

    ok(&pair)
}

#[utoipa::path(
    post,
    path = "/v1/user/token",
    responses(
        (status = 200, description = "New access token", body = Envelope),
        (status = 401, description = "Missing, invalid, expired or revoked refresh token", body = Envelope),
    ),
    security(("bearer" = [])),
    tag = "resident"
)]
#[instrument(skip(service, headers))]
pub async fn token<S: Store>(
    service: Extension<Arc<AuthService<S>>>,
    headers: HeaderMap,
) -> Result<Reply, AuthError> {
    let refresh_token = require_bearer(&headers)?;
    let access_token = service
        .refresh(AccountKind::Resident, refresh_token)
        .await?;

    ok(&AccessTokenResponse { access_token })
}

#[utoipa::path(
    post,
    path = "/v1/user/logout",
    responses(
        (status = 200, description = "Refresh token revoked", body = Envelope),
        (status = 401, description = "Missing or invalid refresh token", body = Envelope),
        (status = 404, description = "Token not found", body = Envelope),
    ),
    security(("bearer" = [])),
    tag = "resident"
)]
#[instrument(skip(service, headers))]
pub async fn logout<S: Store>(
    service: Extension<Arc<AuthService<S>>>,
    headers: HeaderMap,
) -> Result<Reply, AuthError> {
    let refresh_token = require_bearer(&headers)?;
    service
        .logout(AccountKind::Resident, refresh_token)
        .await?;

    message(LOGOUT_SUCCESS)
}

#[utoipa::path(
    get,
    path = "/v1/user/me",
    responses(
        (status = 200, description = "Claims of the authenticated resident", body = Envelope),
        (status = 401, description = "Missing, invalid or expired access token", body = Envelope),
    ),
    security(("bearer" = [])),
    tag = "resident"
)]
pub async fn me<S: Store>(
    service: Extension<Arc<AuthService<S>>>,
    headers: HeaderMap,
) -> Result<Reply, AuthError> {
    let access_token = require_bearer(&headers)?;
    let claims: Claims = service.authenticate(AccountKind::Resident, access_token)?;

    ok(&claims)
}
