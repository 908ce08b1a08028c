#![allow(dead_code)]

use axum_test::TestServer;
use chrono::{DateTime, Duration, Utc};
use cookbook_api::config::Config;
use cookbook_api::domain::entities::{NewAuthToken, NewUser, RequestMeta, TokenKind, User};
use cookbook_api::domain::notifications::Mailer;
use cookbook_api::domain::repositories::UserRepository;
use cookbook_api::infrastructure::mail::LogMailer;
use cookbook_api::infrastructure::persistence::PgUserRepository;
use cookbook_api::routes::router;
use cookbook_api::state::AppState;
use cookbook_api::utils::password::hash_password;
use sqlx::PgPool;
use std::net::SocketAddr;
use std::sync::Arc;

pub const PASSWORD: &str = "correct horse battery";

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/test".to_string(),
        listen_addr: "127.0.0.1:0".to_string(),
        log_level: "info".to_string(),
        log_format: "text".to_string(),
        behind_proxy: false,
        app_url: "http://localhost:3000".to_string(),
        app_debug: false,
        token_signing_secret: "integration-test-secret".to_string(),
        access_token_ttl_minutes: 15,
        refresh_token_ttl_minutes: 43_200,
        access_token_name: "access_token".to_string(),
        refresh_token_name: "refresh_token".to_string(),
        registration_enabled: true,
        throttle_per_minute: 1_000,
        password_reset_ttl_minutes: 60,
        email_verification_ttl_minutes: 1440,
        db_max_connections: 5,
        db_connect_timeout: 5,
        db_idle_timeout: 60,
        db_max_lifetime: 600,
    }
}

pub fn create_test_state(pool: PgPool, config: &Config) -> AppState {
    let mailer: Arc<dyn Mailer> = Arc::new(LogMailer);
    AppState::new(Arc::new(pool), config, mailer)
}

/// Full application over a real socket, so client IPs reach the rate limiter.
pub fn make_server_with(pool: PgPool, config: Config) -> TestServer {
    let state = create_test_state(pool, &config);
    let app = router(state, config.throttle_per_minute)
        .unwrap()
        .into_make_service_with_connect_info::<SocketAddr>();

    TestServer::builder().http_transport().build(app).unwrap()
}

pub fn make_server(pool: PgPool) -> TestServer {
    make_server_with(pool, test_config())
}

pub async fn create_user(pool: &PgPool, email: &str, verified: bool, admin: bool) -> User {
    let repo = PgUserRepository::new(Arc::new(pool.clone()));
    repo.create(NewUser {
        name: "Test Cook".to_string(),
        email: email.to_string(),
        password_hash: hash_password(PASSWORD).unwrap(),
        is_admin: admin,
        email_verified_at: verified.then(Utc::now),
    })
    .await
    .unwrap()
}

pub fn new_token(
    kind: TokenKind,
    owner_id: i64,
    group_id: i64,
    name: &str,
    hash: &str,
    expires_at: Option<DateTime<Utc>>,
) -> NewAuthToken {
    NewAuthToken {
        kind,
        owner_id,
        owner_type: User::OWNER_TYPE.to_string(),
        group_id,
        name: name.to_string(),
        token_hash: hash.to_string(),
        abilities: None,
        meta: RequestMeta::default(),
        expires_at,
    }
}

pub fn in_minutes(minutes: i64) -> Option<DateTime<Utc>> {
    Some(Utc::now() + Duration::minutes(minutes))
}

pub async fn count_tokens(pool: &PgPool, group_id: i64) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM auth_tokens WHERE group_id = $1")
        .bind(group_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn count_live_refresh(pool: &PgPool, group_id: i64) -> i64 {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM auth_tokens \
         WHERE group_id = $1 AND kind = 'refresh' AND revoked_at IS NULL",
    )
    .bind(group_id)
    .fetch_one(pool)
    .await
    .unwrap()
}
