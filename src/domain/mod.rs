//! Domain layer - pure business logic with no external dependencies.
//!
//! This layer contains the core concepts and invariants of the request
//! hardening system:
//! - Rate limiting policies and operation categories
//! - Denylist text sanitization
//! - Typed field validators
//! - Whole-record submission validation
//!
//! All types in this layer are pure and easily testable.

pub mod policy;
pub mod sanitize;
pub mod submission;
pub mod validate;
