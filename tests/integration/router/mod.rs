//! HTTP scenarios through the demo application router

use std::collections::HashMap;

use axum::http::{header::LOCATION, StatusCode};
use tokenauth::{RequestParams, SessionRecords};
use tokenauth_app::Account;
use tower::ServiceExt;

use crate::common::{
    get_request, parse_body, settings_with_sign_in_path, TestApp, ADMIN_EMAIL, ADMIN_TOKEN,
    USER_EMAIL, USER_TOKEN,
};

#[tokio::test]
async fn test_health_check_is_public() {
    let app = TestApp::new().unwrap();

    let resp = app
        .test_router()
        .oneshot(get_request("/health", &[]))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
}

mod test_api_scope {
    use super::*;

    #[test_log::test(tokio::test)]
    async fn test_query_credentials_authenticate() {
        let app = TestApp::new().unwrap();
        let uri = format!("/api/me?user_email={USER_EMAIL}&user_token={USER_TOKEN}");

        let resp = app
            .test_router()
            .oneshot(get_request(&uri, &[]))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = parse_body(resp).await;
        assert_eq!(body["email"], USER_EMAIL);
        assert!(body.get("authentication_token").is_none());
    }

    #[test_log::test(tokio::test)]
    async fn test_header_credentials_are_case_insensitive() {
        let app = TestApp::new().unwrap();

        let resp = app
            .test_router()
            .oneshot(get_request(
                "/api/me",
                &[("X-User-Email", "A@B.COM"), ("X-User-Token", USER_TOKEN)],
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(parse_body(resp).await["username"], "alice");
    }

    #[tokio::test]
    async fn test_wrong_token_is_unauthorized() {
        let app = TestApp::new().unwrap();
        let uri = format!("/api/me?user_email={USER_EMAIL}&user_token=xyz");

        let resp = app
            .test_router()
            .oneshot(get_request(&uri, &[]))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body = parse_body(resp).await;
        assert_eq!(body["error"]["code"], "UNAUTHENTICATED");
    }

    #[tokio::test]
    async fn test_body_params_fill_in_missing_query_params() {
        let app = TestApp::new().unwrap();
        let uri = format!("/api/me?user_email={USER_EMAIL}");
        let mut req = get_request(&uri, &[]);
        req.extensions_mut().insert(RequestParams(HashMap::from([(
            "user_token".to_string(),
            USER_TOKEN.to_string(),
        )])));

        let resp = app.test_router().oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_query_params_win_over_body_params() {
        let app = TestApp::new().unwrap();
        let uri = format!("/api/me?user_email={USER_EMAIL}&user_token=xyz");
        let mut req = get_request(&uri, &[]);
        req.extensions_mut().insert(RequestParams(HashMap::from([(
            "user_token".to_string(),
            USER_TOKEN.to_string(),
        )])));

        let resp = app.test_router().oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_session_record_passes_guard() {
        let app = TestApp::new().unwrap();
        let session = Account::new("User", "session@b.com", "sam", None);
        let mut req = get_request("/api/me", &[]);
        req.extensions_mut().insert(SessionRecords(HashMap::from([(
            "user".to_string(),
            session,
        )])));

        let resp = app.test_router().oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(parse_body(resp).await["email"], "session@b.com");
    }
}

mod test_admin_scope {
    use super::*;

    #[test_log::test(tokio::test)]
    async fn test_missing_credentials_redirect_to_sign_in() {
        let app = TestApp::new().unwrap();

        let resp = app
            .test_router()
            .oneshot(get_request("/admin/dashboard", &[]))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[LOCATION], "/admin_users/sign_in");
    }

    #[tokio::test]
    async fn test_configured_sign_in_path_is_used() {
        let app = TestApp::with_settings(settings_with_sign_in_path("admin_user", "/login"))
            .unwrap();

        let resp = app
            .test_router()
            .oneshot(get_request("/admin/dashboard", &[]))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[LOCATION], "/login");
    }

    #[tokio::test]
    async fn test_admin_headers_authenticate() {
        let app = TestApp::new().unwrap();

        let resp = app
            .test_router()
            .oneshot(get_request(
                "/admin/dashboard",
                &[
                    ("X-AdminUser-Email", ADMIN_EMAIL),
                    ("X-AdminUser-Token", ADMIN_TOKEN),
                ],
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(parse_body(resp).await["signed_in_as"], ADMIN_EMAIL);
    }

    #[tokio::test]
    async fn test_user_token_does_not_open_admin_scope() {
        let app = TestApp::new().unwrap();
        let uri = format!("/admin/dashboard?user_email={USER_EMAIL}&user_token={USER_TOKEN}");

        let resp = app
            .test_router()
            .oneshot(get_request(&uri, &[]))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    }
}
