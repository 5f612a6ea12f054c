use accounts_application::AccountError;
use accounts_core::{TokenError, ValidationError};

use crate::helpers::{PASSWORD, TestApp, secret};

const NEW_PASSWORD: &str = "freshly-reset-secret";

#[tokio::test]
async fn unknown_identifier_gets_no_email_and_no_error() {
    let app = TestApp::new();
    app.register("+15550400001").await;

    app.service
        .request_password_reset("nobody@example.com")
        .await
        .unwrap();

    assert!(
        app.service
            .email_client()
            .last_sent_to("nobody@example.com")
            .await
            .is_none()
    );
}

#[tokio::test]
async fn reset_with_emailed_token_replaces_the_password() {
    let app = TestApp::new();
    let (email, profile) = app.register("+15550400002").await;
    let login = app
        .service
        .authenticate(&email, secret(PASSWORD))
        .await
        .unwrap();

    app.service.request_password_reset(&email).await.unwrap();
    let token = app.last_token_sent_to(&email).await;
    let reset = app
        .service
        .reset_password(token, secret(NEW_PASSWORD), secret(NEW_PASSWORD))
        .await
        .unwrap();

    assert_eq!(reset.id, profile.id);
    assert!(matches!(
        app.service.authenticate(&email, secret(PASSWORD)).await,
        Err(AccountError::Authentication)
    ));
    assert!(
        app.service
            .authenticate(&email, secret(NEW_PASSWORD))
            .await
            .is_ok()
    );
    assert!(
        app.service
            .refresh(login.tokens.refresh_token.as_str())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn reset_can_be_requested_by_phone() {
    let app = TestApp::new();
    let (email, _) = app.register("+15550400003").await;

    app.service
        .request_password_reset("xxxxxxxxxxxx")
        .await
        .unwrap();

    let sent = app.service.email_client().sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, email);
}

#[tokio::test]
async fn reset_token_is_single_use() {
    let app = TestApp::new();
    let (email, _) = app.register("+15550400004").await;
    app.service.request_password_reset(&email).await.unwrap();
    let token = app.last_token_sent_to(&email).await;

    app.service
        .reset_password(token.clone(), secret(NEW_PASSWORD), secret(NEW_PASSWORD))
        .await
        .unwrap();
    let second = app
        .service
        .reset_password(
            token,
            secret("yet-another-secret"),
            secret("yet-another-secret"),
        )
        .await;

    assert!(matches!(
        second,
        Err(AccountError::Token(TokenError::Mismatch))
    ));
}

#[tokio::test]
async fn reset_with_unknown_token_is_rejected() {
    let app = TestApp::new();
    let (email, _) = app.register("+15550400005").await;
    app.service.request_password_reset(&email).await.unwrap();

    let result = app
        .service
        .reset_password(
            secret(&"0".repeat(64)),
            secret(NEW_PASSWORD),
            secret(NEW_PASSWORD),
        )
        .await;

    assert!(matches!(
        result,
        Err(AccountError::Token(TokenError::Mismatch))
    ));
    assert!(
        app.service
            .authenticate(&email, secret(PASSWORD))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn reset_checks_confirmation_before_consuming_the_token() {
    let app = TestApp::new();
    let (email, _) = app.register("+15550400006").await;
    app.service.request_password_reset(&email).await.unwrap();
    let token = app.last_token_sent_to(&email).await;

    let mismatch = app
        .service
        .reset_password(
            token.clone(),
            secret(NEW_PASSWORD),
            secret("typo-in-confirm"),
        )
        .await;

    assert!(matches!(
        mismatch,
        Err(AccountError::Validation(ValidationError::PasswordMismatch))
    ));
    assert!(
        app.service
            .reset_password(token, secret(NEW_PASSWORD), secret(NEW_PASSWORD))
            .await
            .is_ok()
    );
}
