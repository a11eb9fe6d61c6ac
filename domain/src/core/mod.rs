//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`] — domain-level errors
//! - [`string::truncate`] — UTF-8 safe truncation used by prompts and reports

pub mod error;
pub mod string;
