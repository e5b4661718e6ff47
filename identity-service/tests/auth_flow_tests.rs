mod common;

use common::TestAuth;
use identity_service::identity::access::RoleGate;
use identity_service::identity::errors::AuthError;
use identity_service::identity::models::ConfirmationOutcome;
use identity_service::identity::models::EmailAddress;
use identity_service::identity::models::Role;
use identity_service::identity::models::SignupRequest;
use identity_service::identity::models::Username;
use identity_service::identity::ports::AuthenticationPort;

fn signup_request(email: &str, username: &str, password: &str) -> SignupRequest {
    SignupRequest::new(
        EmailAddress::new(email.to_string()).expect("invalid test email"),
        Username::new(username.to_string()).expect("invalid test username"),
        password.to_string(),
    )
}

#[tokio::test]
async fn test_signup_confirm_login_resolve_end_to_end() {
    let app = TestAuth::new();

    let created = app
        .service
        .signup(signup_request("a@x.com", "alice", "pw123456"))
        .await
        .expect("signup failed");
    assert!(!created.confirmed);
    assert_eq!(created.role, Role::User);

    // Pick the verification token up from the "email"
    let token = app.mailer.last_token().expect("no confirmation mail sent");
    let outcome = app
        .service
        .confirm_email(&token)
        .await
        .expect("confirmation failed");
    assert_eq!(outcome, ConfirmationOutcome::Confirmed);

    let pair = app
        .service
        .login("a@x.com", "pw123456")
        .await
        .expect("login failed");
    assert_eq!(pair.token_type, "bearer");

    let resolved = app
        .service
        .resolve_identity(&pair.access_token)
        .await
        .expect("resolve failed");
    assert_eq!(resolved.email.as_str(), "a@x.com");
    assert_eq!(resolved.username.as_str(), "alice");
    assert!(resolved.confirmed);

    // Role gate admits the resolved identity
    let gate = RoleGate::new([Role::Admin, Role::User]);
    assert!(gate.check(&resolved).is_ok());

    let admin_gate = RoleGate::new([Role::Admin]);
    assert!(matches!(
        admin_gate.check(&resolved),
        Err(AuthError::Forbidden)
    ));
}

#[tokio::test]
async fn test_duplicate_signup_keeps_single_credential() {
    let app = TestAuth::new();

    app.service
        .signup(signup_request("a@x.com", "alice", "pw123456"))
        .await
        .expect("first signup failed");

    let result = app
        .service
        .signup(signup_request("a@x.com", "alice2", "pw654321"))
        .await;
    assert!(matches!(result, Err(AuthError::AccountExists(_))));

    assert_eq!(app.repository.count().await, 1);
}

#[tokio::test]
async fn test_login_failure_ladder() {
    let app = TestAuth::new();

    // Unknown email
    let result = app.service.login("z@x.com", "pw123456").await;
    assert!(matches!(result, Err(AuthError::InvalidEmail)));

    // Known but unconfirmed
    app.service
        .signup(signup_request("a@x.com", "alice", "pw123456"))
        .await
        .expect("signup failed");
    let result = app.service.login("a@x.com", "pw123456").await;
    assert!(matches!(result, Err(AuthError::EmailNotConfirmed)));

    // Confirmed but wrong password
    let token = app.mailer.last_token().unwrap();
    app.service.confirm_email(&token).await.unwrap();
    let result = app.service.login("a@x.com", "wrong").await;
    assert!(matches!(result, Err(AuthError::InvalidPassword)));

    // And finally through
    assert!(app.service.login("a@x.com", "pw123456").await.is_ok());
}

#[tokio::test]
async fn test_refresh_rotation_invalidates_previous_token() {
    let app = TestAuth::new();

    app.service
        .signup(signup_request("a@x.com", "alice", "pw123456"))
        .await
        .unwrap();
    let token = app.mailer.last_token().unwrap();
    app.service.confirm_email(&token).await.unwrap();

    let first = app.service.login("a@x.com", "pw123456").await.unwrap();

    let second = app
        .service
        .refresh(&first.refresh_token)
        .await
        .expect("refresh failed");
    assert_ne!(second.refresh_token, first.refresh_token);

    // Replaying the rotated-out token is rejected and revokes the active one
    let replay = app.service.refresh(&first.refresh_token).await;
    assert!(matches!(replay, Err(AuthError::InvalidRefreshToken)));

    let after_revocation = app.service.refresh(&second.refresh_token).await;
    assert!(matches!(
        after_revocation,
        Err(AuthError::InvalidRefreshToken)
    ));

    // Re-login recovers
    assert!(app.service.login("a@x.com", "pw123456").await.is_ok());
}

#[tokio::test]
async fn test_confirm_email_is_idempotent() {
    let app = TestAuth::new();

    app.service
        .signup(signup_request("a@x.com", "alice", "pw123456"))
        .await
        .unwrap();
    let token = app.mailer.last_token().unwrap();

    let first = app.service.confirm_email(&token).await.unwrap();
    assert_eq!(first, ConfirmationOutcome::Confirmed);

    for _ in 0..2 {
        let again = app.service.confirm_email(&token).await.unwrap();
        assert!(again.already_confirmed());
    }
}

#[tokio::test]
async fn test_request_confirmation_resends_token_that_confirms() {
    let app = TestAuth::new();

    app.service
        .signup(signup_request("a@x.com", "alice", "pw123456"))
        .await
        .unwrap();
    assert_eq!(app.mailer.sent_count(), 1);

    app.service
        .request_confirmation("a@x.com")
        .await
        .expect("request failed");
    assert_eq!(app.mailer.sent_count(), 2);

    let token = app.mailer.last_token().unwrap();
    let outcome = app.service.confirm_email(&token).await.unwrap();
    assert_eq!(outcome, ConfirmationOutcome::Confirmed);
}

#[tokio::test]
async fn test_reset_password_revokes_session_material() {
    let app = TestAuth::new();

    app.service
        .signup(signup_request("a@x.com", "alice", "pw123456"))
        .await
        .unwrap();
    let token = app.mailer.last_token().unwrap();
    app.service.confirm_email(&token).await.unwrap();

    let pair = app.service.login("a@x.com", "pw123456").await.unwrap();
    let identity = app
        .service
        .resolve_identity(&pair.access_token)
        .await
        .unwrap();

    app.service
        .reset_password(&identity, "brand_new_pw")
        .await
        .expect("reset failed");

    // Old refresh token no longer rotates
    let replay = app.service.refresh(&pair.refresh_token).await;
    assert!(matches!(replay, Err(AuthError::InvalidRefreshToken)));

    // Old password is gone, new one works
    let old = app.service.login("a@x.com", "pw123456").await;
    assert!(matches!(old, Err(AuthError::InvalidPassword)));
    assert!(app.service.login("a@x.com", "brand_new_pw").await.is_ok());
}

#[tokio::test]
async fn test_avatar_update_is_visible_through_cache() {
    let app = TestAuth::new();

    app.service
        .signup(signup_request("a@x.com", "alice", "pw123456"))
        .await
        .unwrap();
    let token = app.mailer.last_token().unwrap();
    app.service.confirm_email(&token).await.unwrap();

    let pair = app.service.login("a@x.com", "pw123456").await.unwrap();

    // Populate the cache, then mutate the avatar
    let identity = app
        .service
        .resolve_identity(&pair.access_token)
        .await
        .unwrap();
    assert!(identity.avatar_url.is_none());

    app.service
        .update_avatar(&identity, Some("https://cdn.x.com/alice.png".to_string()))
        .await
        .expect("avatar update failed");

    // The overwritten snapshot is what resolves now
    let resolved = app
        .service
        .resolve_identity(&pair.access_token)
        .await
        .unwrap();
    assert_eq!(
        resolved.avatar_url.as_deref(),
        Some("https://cdn.x.com/alice.png")
    );
}
