use crate::{expr::EvalError, mapping::MappingError, traits::FieldWriteError};
use std::fmt;
use thiserror::Error as ThisError;

///
/// Error
///
/// Structured runtime error with a stable classification.
/// Every failure surfaced by a service call is one of these; callers treat
/// all of them as abort-and-report.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct Error {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,

    /// Optional structured error detail.
    pub detail: Option<ErrorDetail>,
}

impl Error {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            detail: None,
        }
    }

    /// Malformed service or facet declaration.
    pub(crate) fn configuration(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Configuration, origin, message)
    }

    /// Update lookup matched no record.
    pub(crate) fn not_found(entity: &str, key: impl fmt::Display) -> Self {
        Self::new(
            ErrorClass::NotFound,
            ErrorOrigin::Service,
            format!("no {entity} matches key {key}"),
        )
    }

    /// Update lookup matched more than one record.
    pub(crate) fn multiple_match(entity: &str, key: impl fmt::Display, count: u64) -> Self {
        Self::new(
            ErrorClass::MultipleMatch,
            ErrorOrigin::Service,
            format!("{count} {entity} records match key {key}, expected exactly one"),
        )
    }

    pub(crate) fn unsupported(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, origin, message)
    }

    pub(crate) fn invariant(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvariantViolation, origin, message)
    }

    /// Re-tag the origin, keeping class and detail.
    #[must_use]
    pub(crate) fn with_origin(mut self, origin: ErrorOrigin) -> Self {
        self.origin = origin;
        self
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.class, ErrorClass::NotFound)
    }

    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self.class, ErrorClass::Storage)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorDetail
///
/// Structured, origin-specific error detail carried by [`Error`].
///

#[derive(Debug, ThisError)]
pub enum ErrorDetail {
    #[error("{0}")]
    Mapping(MappingError),
    #[error("{0}")]
    Eval(EvalError),
    #[error("{0}")]
    Write(FieldWriteError),
    #[error("{0}")]
    Store(StoreError),
}

impl From<MappingError> for Error {
    fn from(err: MappingError) -> Self {
        Self {
            class: err.class(),
            origin: ErrorOrigin::Mapping,
            message: err.to_string(),
            detail: Some(ErrorDetail::Mapping(err)),
        }
    }
}

impl From<EvalError> for Error {
    fn from(err: EvalError) -> Self {
        Self {
            class: err.class(),
            origin: ErrorOrigin::Eval,
            message: err.to_string(),
            detail: Some(ErrorDetail::Eval(err)),
        }
    }
}

impl From<FieldWriteError> for Error {
    fn from(err: FieldWriteError) -> Self {
        Self {
            class: ErrorClass::InvariantViolation,
            origin: ErrorOrigin::Service,
            message: err.to_string(),
            detail: Some(ErrorDetail::Write(err)),
        }
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Self {
            class: ErrorClass::Storage,
            origin: ErrorOrigin::Store,
            message: err.to_string(),
            detail: Some(ErrorDetail::Store(err)),
        }
    }
}

///
/// StoreError
///
/// Failure raised by a repository or context collaborator.
/// Surfaced unchanged as `ErrorClass::Storage`; never retried.
///

#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("no repository registered for {entity}")]
    UnknownRepository { entity: &'static str },

    #[error("identity conflict on {entity}.{field}: {key}")]
    Conflict {
        entity: &'static str,
        field: &'static str,
        key: String,
    },

    #[error("store backend failure: {message}")]
    Backend { message: String },
}

impl StoreError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

///
/// ErrorClass
/// Error taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Configuration,
    MappingNotFound,
    AmbiguousMapping,
    NotFound,
    MultipleMatch,
    Storage,
    Unsupported,
    InvariantViolation,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Configuration => "configuration",
            Self::MappingNotFound => "mapping_not_found",
            Self::AmbiguousMapping => "ambiguous_mapping",
            Self::NotFound => "not_found",
            Self::MultipleMatch => "multiple_match",
            Self::Storage => "storage",
            Self::Unsupported => "unsupported",
            Self::InvariantViolation => "invariant_violation",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Origin taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Mapping,
    Translate,
    Eval,
    Service,
    Aggregation,
    Store,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Mapping => "mapping",
            Self::Translate => "translate",
            Self::Eval => "eval",
            Self::Service => "service",
            Self::Aggregation => "aggregation",
            Self::Store => "store",
        };
        write!(f, "{label}")
    }
}
