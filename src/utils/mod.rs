//! Utility functions for code generation, URL validation and database error
//! classification.
//!
//! - [`code_generator`] - Short code generation strategies
//! - [`url_validator`] - Absolute URL validation
//! - [`db_error`] - PostgreSQL error classification

pub mod code_generator;
pub mod db_error;
pub mod url_validator;
