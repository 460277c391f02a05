use axum::http::StatusCode;
use axum::Json;
use library::LibraryError;

use crate::state::ErrorResponse;

pub fn json_error(
    status: StatusCode,
    message: impl Into<String>,
) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub fn library_error_status(err: &LibraryError) -> StatusCode {
    match err {
        LibraryError::EmptyKey | LibraryError::UnsupportedBrowseType(_) => StatusCode::BAD_REQUEST,
        LibraryError::NotLoaded | LibraryError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        LibraryError::Io(_) | LibraryError::Walk(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn library_json_error(err: LibraryError) -> (StatusCode, Json<ErrorResponse>) {
    json_error(library_error_status(&err), err.to_string())
}
