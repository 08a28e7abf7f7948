//! Error type for `mentor-engine`.

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  /// The request was rejected before any store call.
  #[error("validation failed: {0}")]
  Validation(String),

  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: String },

  /// The referenced entity exists but is in the wrong state for the
  /// operation.
  #[error("precondition failed: {0}")]
  Precondition(String),

  #[error("{context}: {source}")]
  Store {
    context: &'static str,
    #[source]
    source:  BoxError,
  },
}

/// Coarse classification of [`Error`], used by transports to pick a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Validation,
  NotFound,
  Precondition,
  Store,
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Validation(_) => ErrorKind::Validation,
      Self::NotFound { .. } => ErrorKind::NotFound,
      Self::Precondition(_) => ErrorKind::Precondition,
      Self::Store { .. } => ErrorKind::Store,
    }
  }

  pub(crate) fn validation(message: impl Into<String>) -> Self {
    Self::Validation(message.into())
  }

  pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
    Self::NotFound { entity, id: id.to_string() }
  }

  /// Adapter for `map_err`: wrap a store failure with a "failed to …"
  /// context.
  pub(crate) fn store<E>(context: &'static str) -> impl FnOnce(E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    move |source| Self::Store { context, source: Box::new(source) }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
