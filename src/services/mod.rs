//! Business logic free of the HTTP layer.

pub mod collection_service;
pub mod stats_service;

use std::fmt;

use sea_orm::{DbErr, SqlErr};

/// Error type for service operations, classified so the API layer can map
/// each variant to a status code.
#[derive(Debug)]
pub enum ServiceError {
    /// Referenced record does not exist
    NotFound,
    /// Invalid input or a delete blocked by referencing rows
    Validation(String),
    /// Unique constraint violated
    Conflict(String),
    /// Unclassified database failure
    Database(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::NotFound => write!(f, "Resource not found"),
            ServiceError::Validation(msg) => write!(f, "Validation error: {}", msg),
            ServiceError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ServiceError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<DbErr> for ServiceError {
    fn from(e: DbErr) -> Self {
        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => ServiceError::Conflict(msg),
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => ServiceError::Validation(msg),
            _ => ServiceError::Database(e.to_string()),
        }
    }
}
