//! Error types for lectern
//!
//! Services return [`CoreError`], a small classified error that knows how to
//! render itself as an HTTP response. Domain-specific enums such as
//! [`AuthError`] convert into it.
//!
//! ```rust
//! use lectern::errors::{CoreError, CoreErrorKind};
//!
//! let err = CoreError::not_found("Course", "42");
//! assert_eq!(err.kind(), CoreErrorKind::NotFound);
//! assert_eq!(err.kind().code(), "NOT_FOUND");
//! ```

pub mod auth;
pub mod core_error;

pub use auth::AuthError;
pub use core_error::{CoreError, CoreErrorKind};

/// Result type alias for service operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type alias for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
