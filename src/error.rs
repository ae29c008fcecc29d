use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use rusqlite::ffi;
use serde_json::json;
use thiserror::Error;

use crate::schema::TableDef;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{table}.{column} is already taken")]
    UniqueViolation { table: String, column: String },

    #[error("{table}.{column} exceeds its length limit")]
    LengthViolation { table: String, column: String },

    #[error("no row in {table} with id {id}")]
    NotFound { table: String, id: i64 },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl StoreError {
    /// Maps a SQLite constraint failure on `table` to a typed error.
    pub(crate) fn classify(table: &TableDef, err: rusqlite::Error) -> Self {
        let (extended_code, message) = match &err {
            rusqlite::Error::SqliteFailure(e, msg) => (e.extended_code, msg.clone().unwrap_or_default()),
            _ => return StoreError::Database(err),
        };

        match extended_code {
            ffi::SQLITE_CONSTRAINT_UNIQUE => StoreError::UniqueViolation {
                table: table.name().to_string(),
                column: failed_column(table, &message),
            },
            ffi::SQLITE_CONSTRAINT_CHECK => StoreError::length(table, &failed_column(table, &message)),
            _ => StoreError::Database(err),
        }
    }

    pub(crate) fn length(table: &TableDef, column: &str) -> Self {
        StoreError::LengthViolation {
            table: table.name().to_string(),
            column: column.to_string(),
        }
    }

    pub(crate) fn not_found(table: &TableDef, id: i64) -> Self {
        StoreError::NotFound {
            table: table.name().to_string(),
            id,
        }
    }
}

/// Pulls the column out of SQLite's constraint message:
/// `UNIQUE constraint failed: users.username` or
/// `CHECK constraint failed: length(username) <= 50`.
fn failed_column(table: &TableDef, message: &str) -> String {
    let detail = message.split_once("failed: ").map_or("", |(_, d)| d);
    let name = match detail.strip_prefix("length(") {
        Some(rest) => rest.split(')').next(),
        None => detail
            .split(", ")
            .next()
            .and_then(|t| t.strip_prefix(table.name()))
            .and_then(|t| t.strip_prefix('.')),
    };
    name.filter(|n| table.column(n).is_some())
        .unwrap_or_default()
        .to_string()
}

impl ResponseError for StoreError {
    fn status_code(&self) -> StatusCode {
        match self {
            StoreError::UniqueViolation { .. } => StatusCode::CONFLICT,
            StoreError::LengthViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let detail = match self {
            StoreError::Database(_) => "500 Internal Server Error".to_string(),
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "detail": detail }))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },
}
