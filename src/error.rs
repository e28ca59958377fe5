//! Error taxonomy for the alerting core.
//!
//! None of these reach a human directly. Each one is absorbed where it
//! happens and turned into the quiet default: no alert rather than a false
//! alert, and a released wake-resource rather than a leaked one.

use crate::category::Category;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlertError {
    /// The count source could not be queried; the category expires immediately
    #[error("count query for {category} failed: {message}")]
    QueryFailure { category: Category, message: String },

    /// The wake-resource provider refused; alerting continues without it
    #[error("wake-resource acquisition failed: {0}")]
    ResourceAcquisition(String),

    /// A preference value could not be interpreted; a default is used instead
    #[error("invalid value {value:?} for '{key}': {message}")]
    InvalidConfig {
        key: String,
        value: String,
        message: String,
    },

    /// A category released the wake-resource without holding it
    #[error("{0} released the wake-resource without holding it")]
    UnbalancedRelease(Category),

    /// Settings file could not be read or parsed
    #[error("failed to load settings from {}: {message}", path.display())]
    ConfigLoad { path: PathBuf, message: String },
}

pub type Result<T, E = AlertError> = std::result::Result<T, E>;
