use accounts_application::AccountError;
use accounts_core::Role;

use crate::helpers::{PASSWORD, TestApp, secret};

#[tokio::test]
async fn login_with_email_issues_a_token_pair() {
    let app = TestApp::new();
    let (email, profile) = app.register("+15550200001").await;

    let response = app
        .service
        .authenticate(&email.to_uppercase(), secret(PASSWORD))
        .await
        .unwrap();

    assert_eq!(response.user.id, profile.id);
    let claims = app
        .service
        .verify_access_token(response.tokens.access_token.as_str())
        .unwrap();
    assert_eq!(claims.user_id().unwrap(), profile.id);
    assert_eq!(claims.role, Role::User);
}

#[tokio::test]
async fn login_with_phone_succeeds() {
    let app = TestApp::new();
    let (_, profile) = app.register("+15550200002").await;

    let response = app
        .service
        .authenticate("+1 (555) 020-0002", secret(PASSWORD))
        .await
        .unwrap();

    assert_eq!(response.user.id, profile.id);
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = TestApp::new();
    let (email, _) = app.register("+15550200003").await;

    let wrong_password = app
        .service
        .authenticate(&email, secret("not-the-password"))
        .await;
    let unknown_user = app
        .service
        .authenticate("nobody@example.com", secret(PASSWORD))
        .await;

    assert!(matches!(wrong_password, Err(AccountError::Authentication)));
    assert!(matches!(unknown_user, Err(AccountError::Authentication)));
}

#[tokio::test]
async fn each_login_opens_a_separate_session() {
    let app = TestApp::new();
    let (email, _) = app.register("+15550200004").await;

    let first = app
        .service
        .authenticate(&email, secret(PASSWORD))
        .await
        .unwrap();
    let second = app
        .service
        .authenticate(&email, secret(PASSWORD))
        .await
        .unwrap();

    assert_ne!(first.tokens.refresh_token, second.tokens.refresh_token);
    assert!(
        app.service
            .refresh(first.tokens.refresh_token.as_str())
            .await
            .is_ok()
    );
    assert!(
        app.service
            .refresh(second.tokens.refresh_token.as_str())
            .await
            .is_ok()
    );
}
