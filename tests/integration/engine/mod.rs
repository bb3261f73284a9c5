//! Engine-level authentication scenarios

use tokenauth::{
    AuthenticationOutcome, FallbackPolicy, NoMatchReason, RequestContext, TokenAuthError,
};
use tokenauth_app::Account;

use crate::common::{Harness, USER_EMAIL, USER_TOKEN};

fn params(token: &str, email: &str) -> RequestContext<Account> {
    RequestContext::new()
        .with_param("user_token", token)
        .with_param("user_email", email)
}

mod test_end_to_end {
    use super::*;

    #[test_log::test(tokio::test)]
    async fn test_matching_params_sign_in_once() {
        let harness = Harness::new(FallbackPolicy::Exception);
        let mut ctx = params(USER_TOKEN, USER_EMAIL);

        let outcome = harness
            .authenticator
            .authenticate_or_fallback("User", &mut ctx)
            .await
            .unwrap();

        assert!(outcome.matched());
        assert_eq!(ctx.current_record_for("user").unwrap().email, USER_EMAIL);
        assert_eq!(harness.hook.calls(), 1);
        assert_eq!(harness.redirector.calls(), 0);
    }

    #[test_log::test(tokio::test)]
    async fn test_wrong_token_signals_failure_for_scope() {
        let harness = Harness::new(FallbackPolicy::Exception);
        let mut ctx = params("xyz", USER_EMAIL);

        let result = harness
            .authenticator
            .authenticate_or_fallback("User", &mut ctx)
            .await;

        match result {
            Err(TokenAuthError::Unauthenticated { scope }) => assert_eq!(scope, "user"),
            other => panic!("expected Unauthenticated, got {:?}", other.map(|o| o.matched())),
        }
        assert!(ctx.current_record_for("user").is_none());
        assert_eq!(harness.hook.calls(), 0);
    }

    #[test_log::test(tokio::test)]
    async fn test_header_identifier_is_lowercased_before_lookup() {
        let harness = Harness::new(FallbackPolicy::NoFallback);
        let mut ctx = RequestContext::new()
            .with_header("X-User-Token", USER_TOKEN)
            .with_header("X-User-Email", "A@B.COM");

        let outcome = harness
            .authenticator
            .authenticate("User", &mut ctx)
            .await
            .unwrap();

        assert!(outcome.matched());
        assert_eq!(
            harness.finder.lookups(),
            vec![("email".to_string(), "a@b.com".to_string())]
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_delegate_login_without_credentials_redirects_once() {
        let harness = Harness::new(FallbackPolicy::DelegateLogin);
        let mut ctx = RequestContext::new();

        let result = harness
            .authenticator
            .authenticate_or_fallback("User", &mut ctx)
            .await;

        match result {
            Err(TokenAuthError::LoginRequired { scope, location }) => {
                assert_eq!(scope, "user");
                assert_eq!(location, "/users/sign_in");
            }
            other => panic!("expected LoginRequired, got {:?}", other.map(|o| o.matched())),
        }
        assert_eq!(harness.redirector.calls(), 1);
        assert!(harness.finder.lookups().is_empty());
    }
}

mod test_fallback_policies {
    use super::*;

    #[tokio::test]
    async fn test_no_fallback_never_rejects() {
        let harness = Harness::new(FallbackPolicy::NoFallback);

        for mut ctx in [
            RequestContext::new(),
            params("xyz", USER_EMAIL),
            params(USER_TOKEN, "nobody@b.com"),
        ] {
            let outcome = harness
                .authenticator
                .authenticate_or_fallback("User", &mut ctx)
                .await
                .unwrap();
            assert!(!outcome.matched());
        }
        assert_eq!(harness.redirector.calls(), 0);
    }

    #[tokio::test]
    async fn test_exception_spares_session_record() {
        let harness = Harness::new(FallbackPolicy::Exception);
        let session = Account::new("User", "session@b.com", "sam", None);
        let mut ctx = params("xyz", USER_EMAIL).with_current_record("user", session);

        let outcome = harness
            .authenticator
            .authenticate_or_fallback("User", &mut ctx)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            AuthenticationOutcome::NoMatch(NoMatchReason::TokenMismatch)
        );
        assert_eq!(
            ctx.current_record_for("user").unwrap().email,
            "session@b.com"
        );
    }

    #[tokio::test]
    async fn test_delegate_login_ignores_session_record() {
        let harness = Harness::new(FallbackPolicy::DelegateLogin);
        let session = Account::new("User", "session@b.com", "sam", None);
        let mut ctx = RequestContext::new().with_current_record("user", session);

        let result = harness
            .authenticator
            .authenticate_or_fallback("User", &mut ctx)
            .await;

        assert!(matches!(result, Err(TokenAuthError::LoginRequired { .. })));
        assert_eq!(harness.redirector.calls(), 1);
    }
}

mod test_registration {
    use super::*;

    #[test]
    fn test_fallback_selects_silent_hook() {
        let harness = Harness::new(FallbackPolicy::Exception);

        assert_eq!(harness.installed, vec!["authenticate_user_from_token"]);
    }

    #[test]
    fn test_no_fallback_selects_current_record_hook() {
        let harness = Harness::new(FallbackPolicy::NoFallback);

        assert_eq!(harness.installed, vec!["current_user"]);
        assert_eq!(harness.authenticator.registry().len(), 1);
    }
}
