//! Caller identity extracted from request headers.
//!
//! Authentication happens upstream; the API trusts `x-tenant-id` and
//! `x-user-id` as given.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::ApiError;

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const USER_HEADER: &str = "x-user-id";

/// The tenant a request acts in and, when known, the acting user.
#[derive(Debug, Clone, Copy)]
pub struct Identity {
  pub tenant_id: Uuid,
  pub user_id:   Option<Uuid>,
}

impl Identity {
  /// The acting user, for routes that cannot run anonymously.
  pub fn user(&self) -> Result<Uuid, ApiError> {
    self
      .user_id
      .ok_or_else(|| ApiError::BadRequest(format!("missing {USER_HEADER} header")))
  }
}

fn header_uuid(parts: &Parts, name: &str) -> Result<Option<Uuid>, ApiError> {
  let Some(value) = parts.headers.get(name) else {
    return Ok(None);
  };
  value
    .to_str()
    .ok()
    .and_then(|s| Uuid::parse_str(s.trim()).ok())
    .map(Some)
    .ok_or_else(|| ApiError::BadRequest(format!("invalid {name} header")))
}

impl<S> FromRequestParts<S> for Identity
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    let tenant_id = header_uuid(parts, TENANT_HEADER)?
      .ok_or_else(|| ApiError::BadRequest(format!("missing {TENANT_HEADER} header")))?;
    let user_id = header_uuid(parts, USER_HEADER)?;
    Ok(Identity { tenant_id, user_id })
  }
}
