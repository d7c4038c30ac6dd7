use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured runtime error with a stable internal classification.
/// Every failure raised by the engine surfaces as one of these; callers
/// branch on `class`/`detail` rather than on message text.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,

    /// Optional structured error detail.
    /// The variant (if present) must correspond to `origin`.
    pub detail: Option<ErrorDetail>,
}

impl InternalError {
    /// Construct an InternalError with optional origin-specific detail.
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        let message = message.into();

        let detail = match (class, origin) {
            (ErrorClass::Corruption, ErrorOrigin::Store | ErrorOrigin::Index) => {
                Some(ErrorDetail::Store(StoreError::Corrupt {
                    message: message.clone(),
                }))
            }
            _ => None,
        };

        Self {
            class,
            origin,
            message,
            detail,
        }
    }

    /// The target row of a delete/update is not physically present.
    pub fn no_such_row(table: impl Into<String>, hkey: impl Into<String>) -> Self {
        let table = table.into();
        let hkey = hkey.into();

        Self {
            class: ErrorClass::NotFound,
            origin: ErrorOrigin::Store,
            message: format!("no such row: table '{table}' at {hkey}"),
            detail: Some(ErrorDetail::Store(StoreError::NoSuchRow { table, hkey })),
        }
    }

    /// A unique table or group index already holds an equal key.
    pub fn duplicate_key(index: impl Into<String>, key: impl Into<String>) -> Self {
        let index = index.into();
        let key = key.into();

        Self {
            class: ErrorClass::Conflict,
            origin: ErrorOrigin::Index,
            message: format!("duplicate key in index '{index}': {key}"),
            detail: Some(ErrorDetail::Store(StoreError::DuplicateKey { index, key })),
        }
    }

    /// Construct a store-origin corruption error.
    pub(crate) fn store_corruption(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Corruption, ErrorOrigin::Store, message.into())
    }

    /// Construct an index-origin corruption error.
    pub(crate) fn index_corruption(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Corruption, ErrorOrigin::Index, message.into())
    }

    /// Construct a store-origin unsupported error.
    pub(crate) fn store_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Store, message.into())
    }

    /// Construct a store-origin invariant violation.
    pub(crate) fn store_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Store,
            message.into(),
        )
    }

    /// Construct an index-origin invariant violation.
    pub(crate) fn index_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Index,
            message.into(),
        )
    }

    /// Construct an index-origin unsupported error.
    pub(crate) fn index_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Index, message.into())
    }

    /// Construct a schema-origin invariant violation.
    pub(crate) fn schema_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Schema,
            message.into(),
        )
    }

    /// Construct a listener-origin internal error.
    pub fn listener(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, ErrorOrigin::Listener, message.into())
    }

    /// Construct a backend-origin internal error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, ErrorOrigin::Backend, message.into())
    }

    #[must_use]
    pub const fn is_no_such_row(&self) -> bool {
        matches!(
            self.detail,
            Some(ErrorDetail::Store(StoreError::NoSuchRow { .. }))
        )
    }

    #[must_use]
    pub const fn is_duplicate_key(&self) -> bool {
        matches!(
            self.detail,
            Some(ErrorDetail::Store(StoreError::DuplicateKey { .. }))
        )
    }

    /// Corruption means the physical tree disagrees with the schema.
    /// It is never retried.
    #[must_use]
    pub const fn is_corruption(&self) -> bool {
        matches!(self.class, ErrorClass::Corruption)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorDetail
///
/// Structured, origin-specific error detail carried by [`InternalError`].
///

#[derive(Debug, ThisError)]
pub enum ErrorDetail {
    #[error("{0}")]
    Store(StoreError),
}

///
/// StoreError
///
/// Store-specific structured error detail.
/// Never returned directly; always wrapped in [`ErrorDetail::Store`].
///

#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("no such row: table '{table}' at {hkey}")]
    NoSuchRow { table: String, hkey: String },

    #[error("duplicate key in index '{index}': {key}")]
    DuplicateKey { index: String, key: String },

    #[error("store corruption: {message}")]
    Corrupt { message: String },
}

///
/// ErrorClass
/// Internal error taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Corruption,
    NotFound,
    Internal,
    Conflict,
    Unsupported,
    InvariantViolation,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Corruption => "corruption",
            Self::NotFound => "not_found",
            Self::Internal => "internal",
            Self::Conflict => "conflict",
            Self::Unsupported => "unsupported",
            Self::InvariantViolation => "invariant_violation",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Internal origin taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Serialize,
    Store,
    Index,
    Schema,
    Listener,
    Backend,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Serialize => "serialize",
            Self::Store => "store",
            Self::Index => "index",
            Self::Schema => "schema",
            Self::Listener => "listener",
            Self::Backend => "backend",
        };
        write!(f, "{label}")
    }
}

///
/// TESTS
///
