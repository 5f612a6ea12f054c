use accounts_application::AccountError;
use accounts_core::{TokenError, ValidationError};

use crate::helpers::TestApp;

#[tokio::test]
async fn verify_with_emailed_token_marks_email_verified() {
    let app = TestApp::new();
    let (email, profile) = app.register("+15550500001").await;

    app.service
        .request_email_verification(&profile.id)
        .await
        .unwrap();
    let token = app.last_token_sent_to(&email).await;
    let verified = app.service.verify_email(&profile.id, token).await.unwrap();

    assert!(verified.email_verified);
    assert!(
        app.service
            .profile(&profile.id)
            .await
            .unwrap()
            .email_verified
    );
}

#[tokio::test]
async fn newer_request_supersedes_the_previous_token() {
    let app = TestApp::new();
    let (email, profile) = app.register("+15550500002").await;

    app.service
        .request_email_verification(&profile.id)
        .await
        .unwrap();
    let stale = app.last_token_sent_to(&email).await;
    app.service
        .request_email_verification(&profile.id)
        .await
        .unwrap();
    let current = app.last_token_sent_to(&email).await;

    assert!(matches!(
        app.service.verify_email(&profile.id, stale).await,
        Err(AccountError::Token(TokenError::Mismatch))
    ));
    assert!(app.service.verify_email(&profile.id, current).await.is_ok());
}

#[tokio::test]
async fn verify_without_request_is_a_mismatch() {
    let app = TestApp::new();
    let (_, profile) = app.register("+15550500003").await;

    let result = app
        .service
        .verify_email(&profile.id, crate::helpers::secret(&"a".repeat(64)))
        .await;

    assert!(matches!(
        result,
        Err(AccountError::Token(TokenError::Mismatch))
    ));
    assert!(
        !app.service
            .profile(&profile.id)
            .await
            .unwrap()
            .email_verified
    );
}

#[tokio::test]
async fn verified_email_cannot_request_again() {
    let app = TestApp::new();
    let (email, profile) = app.register("+15550500004").await;
    app.service
        .request_email_verification(&profile.id)
        .await
        .unwrap();
    let token = app.last_token_sent_to(&email).await;
    app.service.verify_email(&profile.id, token).await.unwrap();

    let result = app.service.request_email_verification(&profile.id).await;

    assert!(matches!(
        result,
        Err(AccountError::Validation(
            ValidationError::EmailAlreadyVerified
        ))
    ));
    assert_eq!(app.service.email_client().sent().await.len(), 1);
}
