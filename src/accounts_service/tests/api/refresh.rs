use accounts_application::AccountError;
use accounts_core::TokenError;

use crate::helpers::{PASSWORD, TestApp, secret};

#[tokio::test]
async fn refresh_rotates_the_refresh_token() {
    let app = TestApp::new();
    let (email, profile) = app.register("+15550300001").await;
    let login = app
        .service
        .authenticate(&email, secret(PASSWORD))
        .await
        .unwrap();

    let rotated = app
        .service
        .refresh(login.tokens.refresh_token.as_str())
        .await
        .unwrap();

    assert_ne!(rotated.refresh_token, login.tokens.refresh_token);
    let claims = app
        .service
        .verify_access_token(rotated.access_token.as_str())
        .unwrap();
    assert_eq!(claims.user_id().unwrap(), profile.id);
}

#[tokio::test]
async fn replayed_refresh_token_is_not_recognized() {
    let app = TestApp::new();
    let (email, _) = app.register("+15550300002").await;
    let login = app
        .service
        .authenticate(&email, secret(PASSWORD))
        .await
        .unwrap();
    let rotated = app
        .service
        .refresh(login.tokens.refresh_token.as_str())
        .await
        .unwrap();

    let replay = app
        .service
        .refresh(login.tokens.refresh_token.as_str())
        .await;

    assert!(matches!(
        replay,
        Err(AccountError::Token(TokenError::NotRecognized))
    ));
    assert!(
        app.service
            .refresh(rotated.refresh_token.as_str())
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn access_token_is_not_accepted_as_refresh_token() {
    let app = TestApp::new();
    let (email, _) = app.register("+15550300003").await;
    let login = app
        .service
        .authenticate(&email, secret(PASSWORD))
        .await
        .unwrap();

    let result = app
        .service
        .refresh(login.tokens.access_token.as_str())
        .await;

    assert!(matches!(
        result,
        Err(AccountError::Token(TokenError::InvalidSignature))
    ));
}

#[tokio::test]
async fn logout_revokes_only_the_presented_session() {
    let app = TestApp::new();
    let (email, profile) = app.register("+15550300004").await;
    let laptop = app
        .service
        .authenticate(&email, secret(PASSWORD))
        .await
        .unwrap();
    let phone = app
        .service
        .authenticate(&email, secret(PASSWORD))
        .await
        .unwrap();

    app.service
        .logout(&profile.id, laptop.tokens.refresh_token.as_str())
        .await
        .unwrap();

    assert!(matches!(
        app.service
            .refresh(laptop.tokens.refresh_token.as_str())
            .await,
        Err(AccountError::Token(TokenError::NotRecognized))
    ));
    assert!(
        app.service
            .refresh(phone.tokens.refresh_token.as_str())
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn logout_twice_is_harmless() {
    let app = TestApp::new();
    let (email, profile) = app.register("+15550300005").await;
    let login = app
        .service
        .authenticate(&email, secret(PASSWORD))
        .await
        .unwrap();
    let token = login.tokens.refresh_token.as_str();

    app.service.logout(&profile.id, token).await.unwrap();
    app.service.logout(&profile.id, token).await.unwrap();
}

#[tokio::test]
async fn logout_everywhere_revokes_every_session() {
    let app = TestApp::new();
    let (email, profile) = app.register("+15550300006").await;
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

    app.service.logout_all(&profile.id).await.unwrap();

    for token in [first.tokens.refresh_token, second.tokens.refresh_token] {
        assert!(matches!(
            app.service.refresh(token.as_str()).await,
            Err(AccountError::Token(TokenError::NotRecognized))
        ));
    }
}

#[tokio::test]
async fn change_password_ends_existing_sessions() {
    let app = TestApp::new();
    let (email, profile) = app.register("+15550300007").await;
    let login = app
        .service
        .authenticate(&email, secret(PASSWORD))
        .await
        .unwrap();

    app.service
        .change_password(
            &profile.id,
            secret("a-brand-new-secret"),
            secret("a-brand-new-secret"),
        )
        .await
        .unwrap();

    assert!(
        app.service
            .refresh(login.tokens.refresh_token.as_str())
            .await
            .is_err()
    );
    assert!(matches!(
        app.service.authenticate(&email, secret(PASSWORD)).await,
        Err(AccountError::Authentication)
    ));
    assert!(
        app.service
            .authenticate(&email, secret("a-brand-new-secret"))
            .await
            .is_ok()
    );
}
