use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use greetmaster_page::PageError;
use thiserror::Error;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Bad request")]
    BadRequest,

    #[error("Not found")]
    NotFound,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Page error: {0}")]
    Page(#[from] PageError),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Config error: {0}")]
    Config(String),
}

/// Status line and message for the error page, attached to error responses and rendered
/// by the error page layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPage {
    pub status_text: String,
    pub message: &'static str,
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest => StatusCode::BAD_REQUEST,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_page(&self) -> ErrorPage {
        let status = self.status();
        let message = match self {
            ServerError::BadRequest => "The requested URL is invalid.",
            ServerError::NotFound => "The requested URL does not exist.",
            _ => "The server encountered an error while handling the request.",
        };
        ErrorPage {
            status_text: format!(
                "{} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Error")
            ),
            message,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        if self.status().is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let page = self.error_page();
        let mut response = (self.status(), page.message).into_response();
        response.extensions_mut().insert(page);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors() {
        let page = ServerError::BadRequest.error_page();
        assert_eq!(page.status_text, "400 Bad Request");
        assert_eq!(page.message, "The requested URL is invalid.");

        let page = ServerError::NotFound.error_page();
        assert_eq!(page.status_text, "404 Not Found");
        assert_eq!(page.message, "The requested URL does not exist.");
    }

    #[test]
    fn internal_errors() {
        let err = ServerError::Page(PageError::UnknownEncoding {
            label: "x".to_string(),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_page().status_text, "500 Internal Server Error");
    }

    #[test]
    fn response_carries_error_page() {
        let response = ServerError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.extensions().get::<ErrorPage>().map(|p| p.message),
            Some("The requested URL does not exist.")
        );
    }
}
