use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;

use crate::schemas::Person;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Split amounts ({actual}) do not match the total amount ({expected})")]
    InvalidSplit { expected: Decimal, actual: Decimal },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown person: {0}")]
    UnknownPerson(Person),

    #[error("Couldn't find {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidSplit { .. } | Error::InvalidInput(_) | Error::UnknownPerson(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Database(_) | Error::Config(_) | Error::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}
