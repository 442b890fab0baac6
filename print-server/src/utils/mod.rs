//! Shared utilities
//!
//! - [`AppError`] / [`AppResult`] - application errors
//! - [`AppResponse`] - API response envelope
//! - logging setup

pub mod error;
pub mod logger;

pub use error::{AppError, AppResponse, AppResult, ok};
