mod common;

use std::time::Duration;

use serde_json::json;
use simple_auth::services::auth::{
    AuthError, AuthFactory, AuthItem, ConstraintKind, Key, ResolvedKey,
};

use common::{
    EC_PRIVATE, EC_PUBLIC, NOW, RSA_A_PRIVATE, RSA_A_PUBLIC, RSA_B_PRIVATE, RSA_B_PUBLIC, claims,
    frozen_clock,
};

#[test]
fn single_rsa_key_round_trip() {
    let (_, clock) = frozen_clock();
    let factory = AuthFactory::new(Some("rsa"), Some("sha256")).with_clock(clock);

    let issuer = factory.header_provider("svc1", RSA_A_PRIVATE, None);
    let auth = factory.auth_middleware(RSA_A_PUBLIC, None, Some("svc1"));

    let token = issuer
        .issue(&claims(json!({
            "uuid": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "email": "user@example.com",
            "capabilities": ["read"],
        })))
        .unwrap();

    let user = auth.authenticate_token(&token).unwrap().user;
    assert_eq!(user.email(), Some("user@example.com"));
    assert_eq!(user.issuer(), Some("svc1"));
    assert_eq!(user.issued_at().map(|t| t.timestamp()), Some(NOW));
    assert_eq!(user.expires_at().map(|t| t.timestamp()), Some(NOW + 60));
    assert!(user.has_capabilities(&["read"]));

    let other = factory.auth_middleware(RSA_B_PUBLIC, None, None);
    assert_eq!(
        other.authenticate_token(&token).unwrap_err(),
        AuthError::SignatureMismatch
    );
}

#[test]
fn key_list_reports_the_earliest_accepting_key() {
    let (_, clock) = frozen_clock();
    let factory = AuthFactory::new(Some("rsa"), None).with_clock(clock);
    let token = factory
        .header_provider("svc1", RSA_A_PRIVATE, None)
        .issue(&claims(json!({})))
        .unwrap();

    let auth = factory.auth_list_middleware(
        vec![
            Key::from(RSA_B_PUBLIC),
            Key::from(RSA_A_PUBLIC),
            Key::from(RSA_A_PUBLIC),
        ],
        None,
        None,
    );
    let authenticated = auth.authenticate_token(&token).unwrap();
    assert_eq!(authenticated.key, ResolvedKey::Listed { index: 1 });

    let only_b = factory.auth_list_middleware(vec![Key::from(RSA_B_PUBLIC)], None, None);
    assert_eq!(
        only_b.authenticate_token(&token).unwrap_err(),
        AuthError::IssuerNotRecognized
    );
}

#[test]
fn key_list_treats_constraint_failures_as_non_matching() {
    let (_, clock) = frozen_clock();
    let factory = AuthFactory::new(Some("rsa"), None).with_clock(clock);
    let token = factory
        .header_provider("svc1", RSA_A_PRIVATE, None)
        .issue(&claims(json!({})))
        .unwrap();

    let auth = factory.auth_list_middleware(vec![Key::from(RSA_A_PUBLIC)], None, Some("svc2"));
    assert_eq!(
        auth.authenticate_token(&token).unwrap_err(),
        AuthError::IssuerNotRecognized
    );
}

#[test]
fn named_issuers_only_try_their_own_key() {
    let (clock, shared) = frozen_clock();
    let factory = AuthFactory::new(Some("rsa"), None).with_clock(shared);
    let auth = factory.auth_items_middleware(
        vec![
            AuthItem::new("issuer1", RSA_A_PUBLIC),
            AuthItem::new("issuer2", RSA_B_PUBLIC),
        ],
        Some("audience1"),
    );

    let issuer1 = factory
        .header_provider("issuer1", RSA_A_PRIVATE, Some(Duration::from_secs(60)))
        .with_audience("audience1");
    let token = issuer1.issue(&claims(json!({}))).unwrap();
    let authenticated = auth.authenticate_token(&token).unwrap();
    assert_eq!(
        authenticated.key,
        ResolvedKey::Item {
            name: "issuer1".into()
        }
    );

    // Claims to be issuer1 but is signed with issuer2's key.
    let impostor = factory
        .header_provider("issuer1", RSA_B_PRIVATE, None)
        .with_audience("audience1");
    let token = impostor.issue(&claims(json!({}))).unwrap();
    assert_eq!(
        auth.authenticate_token(&token).unwrap_err(),
        AuthError::SignatureMismatch
    );

    // The named item's constraint failure is reported as-is.
    let no_audience = factory.header_provider("issuer2", RSA_B_PRIVATE, None);
    let token = no_audience.issue(&claims(json!({}))).unwrap();
    assert_eq!(
        auth.authenticate_token(&token).unwrap_err(),
        AuthError::ConstraintViolation(ConstraintKind::WrongAudience)
    );

    let token = issuer1.issue(&claims(json!({}))).unwrap();
    clock.advance(chrono::Duration::seconds(61));
    assert_eq!(
        auth.authenticate_token(&token).unwrap_err(),
        AuthError::ConstraintViolation(ConstraintKind::Expired)
    );
}

#[test]
fn ecdsa_tokens_verify_with_the_public_key() {
    let (_, clock) = frozen_clock();
    let factory = AuthFactory::new(Some("ecdsa"), Some("sha256")).with_clock(clock);
    let token = factory
        .header_provider("svc1", EC_PRIVATE, None)
        .issue(&claims(json!({"uuid": "u1"})))
        .unwrap();

    let auth = factory.auth_middleware(EC_PUBLIC, None, None);
    assert!(auth.authenticate_token(&token).is_ok());

    // An RSA verifier refuses the ES256 header.
    let rsa = AuthFactory::new(Some("rsa"), None).auth_middleware(RSA_A_PUBLIC, None, None);
    assert_eq!(
        rsa.authenticate_token(&token).unwrap_err(),
        AuthError::SignatureMismatch
    );
}

#[test]
fn wrong_family_key_material_is_a_signature_mismatch() {
    let (_, clock) = frozen_clock();
    let factory = AuthFactory::new(Some("rsa"), None).with_clock(clock);
    let token = factory
        .header_provider("svc1", RSA_A_PRIVATE, None)
        .issue(&claims(json!({})))
        .unwrap();

    let auth = factory.auth_middleware("not a pem", None, None);
    assert_eq!(
        auth.authenticate_token(&token).unwrap_err(),
        AuthError::SignatureMismatch
    );
}
