mod common;

use actix_web::http::StatusCode;
use actix_web::middleware::Logger;
use actix_web::{test, App};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use common::{auth_service, bearer};
use taskboard::auth::{SignupResponse, TokenResponse};
use taskboard::routes;

#[actix_rt::test]
async fn test_signup_verify_login_flow() {
    let (service, mailer) = auth_service();
    let app = test::init_service(
        App::new()
            .app_data(service.clone())
            .wrap(Logger::default())
            .configure(routes::auth_config),
    )
    .await;

    let credentials = json!({ "email": "a@x.com", "password": "pw1" });

    let req = test::TestRequest::post()
        .uri("/auth/signup")
        .set_json(&credentials)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let created: SignupResponse = test::read_body_json(resp).await;
    assert_eq!(created.email, "a@x.com");
    assert_eq!(created.message, "Verification email sent");

    // Correct password, but the email is not verified yet.
    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(&credentials)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let token = mailer
        .token_for("a@x.com")
        .expect("signup should mail a verification link");
    let req = test::TestRequest::get()
        .uri(&format!("/auth/verify?token={}", token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Email successfully verified");

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(&credentials)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let login: TokenResponse = test::read_body_json(resp).await;
    assert_eq!(login.token_type, "bearer");
    assert!(!login.access_token.is_empty());

    let req = test::TestRequest::get()
        .uri("/auth/me")
        .append_header(bearer(&login.access_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let me: Value = test::read_body_json(resp).await;
    assert_eq!(
        me,
        json!({
            "id": created.id,
            "email": "a@x.com",
            "is_verified": true,
            "role": "user"
        })
    );
}

#[actix_rt::test]
async fn test_duplicate_signup_is_rejected() {
    let (service, _mailer) = auth_service();
    let app = test::init_service(
        App::new()
            .app_data(service.clone())
            .configure(routes::auth_config),
    )
    .await;

    let payload = json!({ "email": "dup@x.com", "password": "pw1" });
    for expected in [StatusCode::OK, StatusCode::BAD_REQUEST] {
        let req = test::TestRequest::post()
            .uri("/auth/signup")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), expected);
    }
}

#[actix_rt::test]
async fn test_invalid_signup_inputs() {
    let (service, _mailer) = auth_service();
    let app = test::init_service(
        App::new()
            .app_data(service.clone())
            .configure(routes::auth_config),
    )
    .await;

    let test_cases = vec![
        (
            json!({ "password": "pw1" }),
            StatusCode::BAD_REQUEST,
            "missing email",
        ),
        (
            json!({ "email": "a@x.com" }),
            StatusCode::BAD_REQUEST,
            "missing password",
        ),
        (
            json!({ "email": "invalid-email", "password": "pw1" }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid email format",
        ),
        (
            json!({ "email": "a@x.com", "password": "" }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "empty password",
        ),
        (
            json!({ "email": "a@x.com", "password": "p".repeat(73) }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "password longer than 72 bytes",
        ),
    ];

    for (payload, expected_status, description) in test_cases {
        let req = test::TestRequest::post()
            .uri("/auth/signup")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body_bytes = test::read_body(resp).await;

        assert_eq!(
            status,
            expected_status,
            "Test case failed: {}. Body: {:?}",
            description,
            String::from_utf8_lossy(&body_bytes)
        );
    }
}

#[actix_rt::test]
async fn test_login_failures() {
    let (service, _mailer) = auth_service();
    let app = test::init_service(
        App::new()
            .app_data(service.clone())
            .configure(routes::auth_config),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/auth/signup")
        .set_json(json!({ "email": "login@x.com", "password": "pw1" }))
        .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());

    let test_cases = vec![
        (
            json!({ "email": "login@x.com", "password": "wrong" }),
            StatusCode::UNAUTHORIZED,
            "incorrect password",
        ),
        (
            json!({ "email": "nobody@x.com", "password": "pw1" }),
            StatusCode::UNAUTHORIZED,
            "non-existent user",
        ),
        (
            json!({ "email": "login@x.com", "password": "pw1" }),
            StatusCode::FORBIDDEN,
            "unverified user",
        ),
    ];

    for (payload, expected_status, description) in test_cases {
        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;

        assert_eq!(status, expected_status, "Test case failed: {}", description);
        assert!(body.get("access_token").is_none(), "{} leaked a token", description);
    }
}

#[actix_rt::test]
async fn test_verification_token_is_not_a_session_credential() {
    let (service, mailer) = auth_service();
    let app = test::init_service(
        App::new()
            .app_data(service.clone())
            .configure(routes::auth_config),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/auth/signup")
        .set_json(json!({ "email": "a@x.com", "password": "pw1" }))
        .to_request();
    test::call_service(&app, req).await;
    let verification_token = mailer.token_for("a@x.com").unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/auth/verify?token={}", verification_token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    // Still not usable as a bearer credential after it served its purpose.
    let req = test::TestRequest::get()
        .uri("/auth/me")
        .append_header(bearer(&verification_token))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_rt::test]
async fn test_verify_rejects_wrong_tokens() {
    let (service, _mailer) = auth_service();
    let app = test::init_service(
        App::new()
            .app_data(service.clone())
            .configure(routes::auth_config),
    )
    .await;

    let session_token = service.tokens().issue_session(1).unwrap();
    let unknown_email = service.tokens().issue_verification("ghost@x.com").unwrap();

    let test_cases = vec![
        ("garbage".to_string(), StatusCode::BAD_REQUEST, "malformed token"),
        (session_token, StatusCode::BAD_REQUEST, "session token"),
        (unknown_email, StatusCode::NOT_FOUND, "unknown email"),
    ];

    for (token, expected_status, description) in test_cases {
        let req = test::TestRequest::get()
            .uri(&format!("/auth/verify?token={}", token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), expected_status, "Test case failed: {}", description);
    }

    let req = test::TestRequest::get().uri("/auth/verify").to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );
}

#[actix_rt::test]
async fn test_me_requires_valid_session() {
    let (service, _mailer) = auth_service();
    let app = test::init_service(
        App::new()
            .app_data(service.clone())
            .configure(routes::auth_config),
    )
    .await;

    let req = test::TestRequest::get().uri("/auth/me").to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let req = test::TestRequest::get()
        .uri("/auth/me")
        .append_header(("Authorization", "Token abc"))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let req = test::TestRequest::get()
        .uri("/auth/me")
        .append_header(bearer("not-a-jwt"))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    // Well-formed session for a user that does not exist.
    let orphan = service.tokens().issue_session(404).unwrap();
    let req = test::TestRequest::get()
        .uri("/auth/me")
        .append_header(bearer(&orphan))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_rt::test]
async fn test_resend_verification() {
    let (service, mailer) = auth_service();
    let app = test::init_service(
        App::new()
            .app_data(service.clone())
            .configure(routes::auth_config),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/auth/signup")
        .set_json(json!({ "email": "a@x.com", "password": "pw1" }))
        .to_request();
    test::call_service(&app, req).await;
    assert_eq!(mailer.sent_count(), 1);

    let req = test::TestRequest::post()
        .uri("/auth/resend-verification")
        .set_json(json!({ "email": "a@x.com" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    assert_eq!(mailer.sent_count(), 2);

    let req = test::TestRequest::post()
        .uri("/auth/resend-verification")
        .set_json(json!({ "email": "ghost@x.com" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    // The resent link verifies the account.
    let token = mailer.token_for("a@x.com").unwrap();
    let req = test::TestRequest::get()
        .uri(&format!("/auth/verify?token={}", token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}
