//! Error type for `mentor-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] mentor_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored row violates an invariant the domain types enforce, e.g. an
  /// assignment with both or neither target column set.
  #[error("invalid row in {table}: {reason}")]
  Decode { table: &'static str, reason: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
