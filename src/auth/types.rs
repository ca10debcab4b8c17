//! Request/response types for auth endpoints and the shared envelope.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Uniform response wrapper used by every endpoint.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Envelope {
    pub code: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<ErrorBody>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub message: String,
}

impl Envelope {
    /// 2xx envelope carrying `data`.
    #[must_use]
    pub fn success(status: StatusCode, data: Value) -> Self {
        Self {
            code: status.as_u16().to_string(),
            status: "success".to_string(),
            data: Some(data),
            errors: None,
        }
    }

    /// Error envelope; `status` is the canonical reason phrase.
    #[must_use]
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: status.as_u16().to_string(),
            status: status.canonical_reason().unwrap_or("Error").to_string(),
            data: None,
            errors: Some(ErrorBody {
                message: message.into(),
            }),
        }
    }
}

/// An envelope paired with the HTTP status it is sent with.
#[derive(Debug)]
pub struct Reply(pub StatusCode, pub Envelope);

impl Reply {
    #[must_use]
    pub fn ok(data: Value) -> Self {
        Self(StatusCode::OK, Envelope::success(StatusCode::OK, data))
    }

    #[must_use]
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self(status, Envelope::error(status, message))
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> axum::response::Response {
        (self.0, Json(self.1)).into_response()
    }
}

/// Resident registration; every field is required and non-empty.
#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct ResidentRegisterRequest {
    pub name: Option<String>,
    pub password: Option<String>,
    #[serde(alias = "nik")]
    pub national_id: Option<String>,
    pub rt: Option<String>,
    pub rw: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct AdminRegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Login body. Residents send `national_id`, admins `username`; both accept
/// `identifier`.
#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct LoginRequest {
    #[serde(alias = "national_id", alias = "nik", alias = "username")]
    pub identifier: Option<String>,
    pub password: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

/// Treat absent and blank fields alike.
pub(crate) fn required(field: Option<&String>) -> Option<&str> {
    field.map(String::as_str).filter(|value| !value.trim().is_empty())
}
