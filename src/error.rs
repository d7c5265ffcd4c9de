use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use snafu::Snafu;
use std::{num::ParseIntError, path::PathBuf, str::ParseBoolError};

pub type MantraResult<T> = Result<T, MantraError>;

///display strings are sent to clients as-is, so they must never include the source
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum MantraError {
    #[snafu(display("Error opening database"))]
    OpenDatabase { source: sqlx::Error },
    #[snafu(display("Error getting db connection"))]
    GetDatabaseConnection { source: sqlx::Error },
    #[snafu(display("Error making SQL query"))]
    MakeQuery { source: sqlx::Error },
    #[snafu(display("Registration failed. Please try again."))]
    InsertStudent { source: sqlx::Error },
    #[snafu(display("Registration failed. Please try again."))]
    RegisterStudent {
        #[snafu(source(from(MantraError, Box::new)))]
        source: Box<MantraError>,
    },
    #[snafu(display("Failed to fetch students"))]
    FetchStudents { source: sqlx::Error },
    #[snafu(display("Failed to fetch student"))]
    FetchStudent { source: sqlx::Error, id: i64 },
    #[snafu(display("Error committing SQL transaction"))]
    CommitTransaction { source: sqlx::Error },
    #[snafu(display("Error rolling back SQL transaction"))]
    RollbackTransaction { source: sqlx::Error },
    #[snafu(display("Error migrating DB schema"))]
    MigrateError { source: sqlx::migrate::MigrateError },
    #[snafu(display("Unable to decode stored timestamp {:?}", original))]
    InvalidStoredTimestamp {
        source: time::error::Parse,
        original: String,
    },
    #[snafu(display("Unable to format timestamp for storage"))]
    FormatTimestamp { source: time::error::Format },
    #[snafu(display("Unable to retrieve env var `{}`", name))]
    BadEnvVar {
        source: dotenvy::Error,
        name: &'static str,
    },
    #[snafu(display("Unable to parse env var `{}` as a number", name))]
    ParseNumber {
        source: ParseIntError,
        name: &'static str,
    },
    #[snafu(display("Unable to parse env var `{}` as a boolean", name))]
    ParseBool {
        source: ParseBoolError,
        name: &'static str,
    },
    #[snafu(display("Unable to create uploads directory {:?}", path))]
    CreateUploadsDirectory {
        source: std::io::Error,
        path: PathBuf,
    },
    #[snafu(display("Unable to save uploaded photo"))]
    WritePhoto {
        source: std::io::Error,
        path: PathBuf,
    },
    #[snafu(display("Error with multipart form input"))]
    Multipart {
        source: axum::extract::multipart::MultipartError,
    },
    #[snafu(display("All required fields must be provided"))]
    MissingRequiredFields,
    #[snafu(display("Invalid Aadhar number format"))]
    InvalidAadhar,
    #[snafu(display("Invalid mobile number format"))]
    InvalidMobile,
    #[snafu(display("Only image files are allowed!"))]
    PhotoNotAnImage { content_type: Option<String> },
    #[snafu(display("File size too large. Maximum size is 2MB."))]
    PhotoTooLarge { size: usize, max: usize },
    #[snafu(display("Student not found"))]
    MissingStudent { id: String },
    #[snafu(display("Not found"))]
    UnknownRoute { path: String },
}

impl MantraError {
    #[allow(clippy::match_same_arms)]
    pub fn status_code(&self) -> StatusCode {
        const ISE: StatusCode = StatusCode::INTERNAL_SERVER_ERROR; //internal server error
        const NF: StatusCode = StatusCode::NOT_FOUND; //not found
        const BI: StatusCode = StatusCode::BAD_REQUEST; //bad input

        match self {
            Self::OpenDatabase { .. } | Self::GetDatabaseConnection { .. } => ISE,
            Self::MakeQuery { .. } => ISE,
            Self::InsertStudent { .. } | Self::RegisterStudent { .. } => ISE,
            Self::FetchStudents { .. } | Self::FetchStudent { .. } => ISE,
            Self::CommitTransaction { .. } | Self::RollbackTransaction { .. } => ISE,
            Self::MigrateError { .. } => ISE,
            Self::InvalidStoredTimestamp { .. } | Self::FormatTimestamp { .. } => ISE,
            Self::BadEnvVar { .. } | Self::ParseNumber { .. } | Self::ParseBool { .. } => ISE,
            Self::CreateUploadsDirectory { .. } | Self::WritePhoto { .. } => ISE,
            Self::Multipart { source } => source.status(),
            Self::MissingRequiredFields | Self::InvalidAadhar | Self::InvalidMobile => BI,
            Self::PhotoNotAnImage { .. } | Self::PhotoTooLarge { .. } => BI,
            Self::MissingStudent { .. } | Self::UnknownRoute { .. } => NF,
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    success: bool,
    message: String,
}

impl IntoResponse for MantraError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        if status_code.is_server_error() {
            error!(?self, "Error!");
        } else {
            warn!(?self, %status_code, "Rejected request");
        }

        (
            status_code,
            Json(ErrorBody {
                success: false,
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_bad_requests() {
        for e in [
            MantraError::MissingRequiredFields,
            MantraError::InvalidAadhar,
            MantraError::InvalidMobile,
            MantraError::PhotoNotAnImage { content_type: None },
            MantraError::PhotoTooLarge { size: 3, max: 2 },
        ] {
            assert_eq!(e.status_code(), StatusCode::BAD_REQUEST, "{e}");
        }
    }

    #[test]
    fn photo_rejections_have_distinct_messages() {
        let mime = MantraError::PhotoNotAnImage {
            content_type: Some("text/plain".into()),
        }
        .to_string();
        let size = MantraError::PhotoTooLarge { size: 3, max: 2 }.to_string();
        assert_ne!(mime, size);
    }

    #[test]
    fn transaction_errors_read_cleanly() {
        let commit = MantraError::CommitTransaction {
            source: sqlx::Error::PoolClosed,
        };
        assert_eq!(commit.to_string(), "Error committing SQL transaction");
    }

    #[test]
    fn storage_errors_hide_their_source() {
        let e = MantraError::InsertStudent {
            source: sqlx::Error::PoolClosed,
        };
        assert_eq!(e.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.to_string(), "Registration failed. Please try again.");

        let wrapped = MantraError::RegisterStudent {
            source: Box::new(MantraError::GetDatabaseConnection {
                source: sqlx::Error::PoolClosed,
            }),
        };
        assert_eq!(wrapped.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(wrapped.to_string(), "Registration failed. Please try again.");
    }
}
