//! HTTP mapping for domain errors.
//!
//! Keep the domain free of transport concerns by translating [`Error`] into
//! Actix responses here. The JSON envelope is the serialised domain error;
//! internal errors are redacted before leaving the process.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use tracing::error;

use crate::domain::{Error, ErrorCode};

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self.code() {
            ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if matches!(self.code(), ErrorCode::InternalError) {
            error!(error = %self, "internal error returned to client");
            let redacted = Error::internal("Internal server error");
            return HttpResponse::build(self.status_code()).json(redacted);
        }
        HttpResponse::build(self.status_code()).json(self)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for status mapping and redaction.
    use actix_web::ResponseError;
    use actix_web::http::StatusCode;
    use rstest::rstest;

    use crate::domain::Error;

    #[rstest]
    #[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
    #[case(Error::unauthorized("who"), StatusCode::UNAUTHORIZED)]
    #[case(Error::forbidden("no"), StatusCode::FORBIDDEN)]
    #[case(Error::not_found("gone"), StatusCode::NOT_FOUND)]
    #[case(Error::service_unavailable("down"), StatusCode::SERVICE_UNAVAILABLE)]
    #[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
    fn codes_map_to_http_statuses(#[case] error: Error, #[case] expected: StatusCode) {
        assert_eq!(error.status_code(), expected);
    }

    #[actix_web::test]
    async fn internal_messages_are_redacted() {
        let response = Error::internal("secret pool url").error_response();
        let bytes = actix_web::body::to_bytes(response.into_body())
            .await
            .expect("body readable");
        let text = String::from_utf8(bytes.to_vec()).expect("utf8 body");
        assert!(!text.contains("secret pool url"));
        assert!(text.contains("Internal server error"));
    }
}
