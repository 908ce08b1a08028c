//! Shared application state injected into every handler.

use chrono::Duration;
use sqlx::PgPool;
use std::sync::Arc;

use crate::application::services::{
    AccountService, AccountSettings, AuthService, AuthSettings, TokenIssuer, TokenLifetimes,
    UserService,
};
use crate::config::Config;
use crate::domain::notifications::Mailer;
use crate::infrastructure::persistence::{
    PgOneTimeTokenRepository, PgTokenRepository, PgUserRepository,
};
use crate::utils::TokenCodec;

pub type PgAuthService = AuthService<PgTokenRepository, PgUserRepository>;
pub type PgAccountService =
    AccountService<PgTokenRepository, PgUserRepository, PgOneTimeTokenRepository>;
pub type PgUserService = UserService<PgUserRepository>;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<PgPool>,
    pub auth_service: Arc<PgAuthService>,
    pub account_service: Arc<PgAccountService>,
    pub user_service: Arc<PgUserService>,
    /// Read client IPs from proxy headers.
    pub behind_proxy: bool,
}

impl AppState {
    /// Wires repositories and services on top of `pool`.
    pub fn new(pool: Arc<PgPool>, config: &Config, mailer: Arc<dyn Mailer>) -> Self {
        let tokens = Arc::new(PgTokenRepository::new(pool.clone()));
        let users = Arc::new(PgUserRepository::new(pool.clone()));
        let one_time = Arc::new(PgOneTimeTokenRepository::new(pool.clone()));
        let codec = TokenCodec::new(config.token_signing_secret.clone());

        let issuer = Arc::new(TokenIssuer::new(
            tokens.clone(),
            codec.clone(),
            TokenLifetimes {
                access: Duration::minutes(config.access_token_ttl_minutes),
                refresh: config.refresh_token_ttl(),
            },
        ));

        let auth_service = Arc::new(AuthService::new(
            tokens.clone(),
            users.clone(),
            issuer,
            AuthSettings {
                access_token_name: config.access_token_name.clone(),
                refresh_token_name: config.refresh_token_name.clone(),
                registration_enabled: config.registration_enabled,
            },
        ));

        let account_service = Arc::new(AccountService::new(
            tokens.clone(),
            users.clone(),
            one_time,
            auth_service.clone(),
            codec,
            mailer,
            AccountSettings {
                app_url: config.app_url.clone(),
                email_verification_ttl: Duration::minutes(config.email_verification_ttl_minutes),
                password_reset_ttl: Duration::minutes(config.password_reset_ttl_minutes),
            },
        ));

        let user_service = Arc::new(UserService::new(users));

        Self {
            db: pool,
            auth_service,
            account_service,
            user_service,
            behind_proxy: config.behind_proxy,
        }
    }
}
