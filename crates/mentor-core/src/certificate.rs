//! Completion certificates and their human-readable numbers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Metadata, assignment::AssignmentTarget};

/// Fixed prefix of every certificate number.
pub const CERTIFICATE_PREFIX: &str = "CERT-";

/// Number of hex characters following [`CERTIFICATE_PREFIX`].
pub const CERTIFICATE_TOKEN_LEN: usize = 8;

/// Proof that an assignment was completed. Records are never deleted; a
/// revoked certificate keeps its row with `is_valid = false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
  pub certificate_id:     Uuid,
  pub tenant_id:          Uuid,
  pub assignment_id:      Uuid,
  pub user_id:            Uuid,
  pub target:             Option<AssignmentTarget>,
  pub certificate_number: String,
  pub issued_at:          DateTime<Utc>,
  pub expires_at:         Option<DateTime<Utc>>,
  pub is_valid:           bool,
  pub metadata:           Metadata,
}

/// Generate a fresh certificate number, e.g. `CERT-9F86D081`.
///
/// The token is cut from a random v4 UUID rather than a counter, so numbers
/// carry no ordering information.
pub fn generate_certificate_number() -> String {
  let token = Uuid::new_v4().simple().to_string().to_uppercase();
  format!("{CERTIFICATE_PREFIX}{}", &token[..CERTIFICATE_TOKEN_LEN])
}

/// Whether `number` has the shape produced by [`generate_certificate_number`].
pub fn is_certificate_number(number: &str) -> bool {
  number.strip_prefix(CERTIFICATE_PREFIX).is_some_and(|token| {
    token.len() == CERTIFICATE_TOKEN_LEN
      && token
        .chars()
        .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
  })
}
