//! Error types for `mentor-core`.

use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown {kind} value: {value:?}")]
  UnknownVariant { kind: &'static str, value: String },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Parse a stored discriminant string into one of the core enums.
///
/// `kind` names the enum in the error message, e.g. `"assignment status"`.
pub fn parse_variant<T: FromStr>(kind: &'static str, value: &str) -> Result<T> {
  value.parse().map_err(|_| Error::UnknownVariant {
    kind,
    value: value.to_owned(),
  })
}
