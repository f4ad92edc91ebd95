//! Session lifecycle HTTP handlers.
//!
//! ```text
//! POST /api/v1/login   {"username":"...","password":"..."}
//! POST /api/v1/logout
//! GET  /api/v1/users/me
//! ```
//!
//! Credential verification lives behind the [`LoginService`] port; these
//! handlers only translate payloads and persist the resulting identity in
//! the session cookie.

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::ports::LoginService;
use crate::domain::{Error, LoginCredentials, LoginValidationError};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Login request body for `POST /api/v1/login`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Account username.
    pub username: String,
    /// Account password.
    pub password: String,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.username, &value.password)
    }
}

/// Identity payload returned by login and `GET /users/me`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUserBody {
    /// The authenticated identity.
    pub user_id: String,
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    match err {
        LoginValidationError::EmptyUsername => Error::invalid_request("username must not be empty")
            .with_details(json!({ "field": "username", "code": "empty_username" })),
        LoginValidationError::EmptyPassword => Error::invalid_request("password must not be empty")
            .with_details(json!({ "field": "password", "code": "empty_password" })),
    }
}

/// Authenticate and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = CurrentUserBody,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error)
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<CurrentUserBody>> {
    let credentials =
        LoginCredentials::try_from(payload.into_inner()).map_err(map_login_validation_error)?;
    let user_id = state.login.authenticate(&credentials).await?;
    session.persist_user(&user_id)?;
    Ok(web::Json(CurrentUserBody {
        user_id: user_id.to_string(),
    }))
}

/// End the current session.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 204, description = "Session ended")),
    tags = ["users"],
    operation_id = "logout",
    security([])
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.clear();
    HttpResponse::NoContent().finish()
}

/// The authenticated identity, for dashboards and nav state.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current identity", body = CurrentUserBody),
        (status = 401, description = "Login required", body = Error)
    ),
    tags = ["users"],
    operation_id = "currentUser",
    security(("SessionCookie" = []))
)]
#[get("/users/me")]
pub async fn current_user(session: SessionContext) -> ApiResult<web::Json<CurrentUserBody>> {
    let user_id = session.require_user_id()?;
    Ok(web::Json(CurrentUserBody {
        user_id: user_id.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, test as actix_test, web};
    use rstest::rstest;
    use serde_json::Value;

    use super::*;
    use crate::domain::{ListingService, UserId};
    use crate::inbound::http::state::HttpState;
    use crate::test_support::{InMemoryBlobStore, InMemoryListingRepository, InMemoryLoginService};

    fn fixture_state() -> HttpState {
        let repository = Arc::new(InMemoryListingRepository::new());
        let store = Arc::new(InMemoryBlobStore::new());
        let service = Arc::new(ListingService::new(repository, Arc::clone(&store)));
        let login_service = InMemoryLoginService::new().with_account(
            "gita",
            "password",
            UserId::new("11111111-1111-1111-1111-111111111111").expect("fixture id"),
        );
        HttpState::new(service.clone(), service, Arc::new(login_service), store)
    }

    fn test_app(
        state: HttpState,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(web::Data::new(state))
            .wrap(crate::inbound::http::test_utils::test_session_middleware())
            .service(
                web::scope("/api/v1")
                    .service(login)
                    .service(logout)
                    .service(current_user),
            )
    }

    #[rstest]
    #[case("", "password", "empty_username")]
    #[case("gita", "", "empty_password")]
    #[actix_web::test]
    async fn login_rejects_blank_fields(
        #[case] username: &str,
        #[case] password: &str,
        #[case] expected_code: &str,
    ) {
        let app = actix_test::init_service(test_app(fixture_state())).await;
        let request = actix_test::TestRequest::post()
            .uri("/api/v1/login")
            .set_json(LoginRequest {
                username: username.into(),
                password: password.into(),
            })
            .to_request();

        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["details"]["code"], expected_code);
    }

    #[actix_web::test]
    async fn login_rejects_wrong_credentials() {
        let app = actix_test::init_service(test_app(fixture_state())).await;
        let request = actix_test::TestRequest::post()
            .uri("/api/v1/login")
            .set_json(LoginRequest {
                username: "gita".into(),
                password: "wrong".into(),
            })
            .to_request();

        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn login_establishes_a_session_and_me_reflects_it() {
        let app = actix_test::init_service(test_app(fixture_state())).await;
        let login_res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/login")
                .set_json(LoginRequest {
                    username: "gita".into(),
                    password: "password".into(),
                })
                .to_request(),
        )
        .await;
        assert!(login_res.status().is_success());
        let cookie = login_res
            .response()
            .cookies()
            .find(|c| c.name() == "session")
            .expect("session cookie")
            .into_owned();

        let me_res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/users/me")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert!(me_res.status().is_success());
        let body: Value = actix_test::read_body_json(me_res).await;
        assert_eq!(body["userId"], "11111111-1111-1111-1111-111111111111");
    }

    #[actix_web::test]
    async fn me_requires_a_session() {
        let app = actix_test::init_service(test_app(fixture_state())).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/users/me")
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
