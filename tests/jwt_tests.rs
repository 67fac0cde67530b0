//! 令牌服务集成测试（无需数据库）

use boarding_service::{
    auth::{Claims, JwtService, TokenError},
    models::user::User,
};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use uuid::Uuid;

mod common;

const ACCESS: &str = "test-access-secret-for-testing-only-000";

fn service() -> JwtService {
    JwtService::from_config(&common::create_test_security_config()).unwrap()
}

fn user() -> User {
    User::new(
        "captain".to_string(),
        "captain@example.com".to_string(),
        "hash".to_string(),
    )
}

fn sign(payload: serde_json::Value) -> String {
    encode(
        &Header::default(),
        &payload,
        &EncodingKey::from_secret(ACCESS.as_bytes()),
    )
    .unwrap()
}

#[test]
fn test_issued_pair_validates_with_matching_keys() {
    let service = service();
    let user = user();

    let pair = service.issue_token_pair(&user).unwrap();
    let access = service.validate_access_token(&pair.access_token).unwrap();
    let refresh = service.validate_refresh_token(&pair.refresh_token).unwrap();

    assert_eq!(access.user_id, user.id);
    assert_eq!(refresh.user_id, user.id);
    assert_eq!(access.email, "captain@example.com");
    assert!(pair.refresh_expires_at > pair.access_expires_at);
    assert_eq!(
        (pair.access_expires_at.timestamp() - access.iat) as u64,
        service.access_token_exp_secs()
    );
}

#[test]
fn test_expired_token_is_rejected_without_leeway() {
    let now = Utc::now().timestamp();
    let token = sign(json!({
        "user_id": Uuid::new_v4(),
        "username": "captain",
        "email": "captain@example.com",
        "token_id": Uuid::new_v4(),
        "iat": now - 120,
        "nbf": now - 120,
        "exp": now - 1,
    }));

    assert_eq!(service().extract_claims(&token), Err(TokenError::Expired));
}

#[test]
fn test_token_issued_a_second_ago_is_valid() {
    let now = Utc::now().timestamp();
    let claims = Claims {
        user_id: Uuid::new_v4(),
        username: "captain".to_string(),
        email: "captain@example.com".to_string(),
        token_id: Uuid::new_v4(),
        iat: now - 1,
        nbf: now - 1,
        exp: now + 300,
    };
    let token = sign(serde_json::to_value(&claims).unwrap());

    assert_eq!(service().extract_claims(&token).unwrap(), claims);
}

#[test]
fn test_missing_claims_are_malformed() {
    let now = Utc::now().timestamp();

    // 缺少 user_id
    let token = sign(json!({
        "username": "captain",
        "email": "captain@example.com",
        "token_id": Uuid::new_v4(),
        "iat": now,
        "nbf": now,
        "exp": now + 300,
    }));
    assert_eq!(service().extract_claims(&token), Err(TokenError::Malformed));

    // user_id 类型错误
    let token = sign(json!({
        "user_id": 42,
        "username": "captain",
        "email": "captain@example.com",
        "token_id": Uuid::new_v4(),
        "iat": now,
        "nbf": now,
        "exp": now + 300,
    }));
    assert_eq!(service().extract_claims(&token), Err(TokenError::Malformed));
}

#[test]
fn test_foreign_key_signature_is_invalid() {
    let other = JwtService::new(
        "some-other-access-secret-0123456789abc",
        "some-other-refresh-secret-0123456789ab",
        300,
        3600,
    );
    let (token, _) = other.issue_access_token(&user()).unwrap();

    assert_eq!(
        service().extract_claims(&token),
        Err(TokenError::InvalidSignature)
    );
}

#[test]
fn test_refresh_token_is_not_an_access_token() {
    let service = service();
    let (refresh, _) = service.issue_refresh_token(&user()).unwrap();

    assert_eq!(
        service.extract_claims(&refresh),
        Err(TokenError::InvalidSignature)
    );
}

#[test]
fn test_from_config_rejects_weak_secrets() {
    let mut config = common::create_test_security_config();
    config.refresh_token_secret = config.access_token_secret.clone();
    assert!(JwtService::from_config(&config).is_err());

    let mut config = common::create_test_security_config();
    config.access_token_secret = secrecy::Secret::new("short".to_string());
    assert!(JwtService::from_config(&config).is_err());
}
