//! CLI administration tool for cookbook-api.
//!
//! Manages users and their sessions directly in the database, without going
//! through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Create a user (prompts for missing values)
//! cargo run --bin admin -- user create --email chef@example.com --admin --verified
//!
//! # Grant or remove the admin role (ends all sessions of the user)
//! cargo run --bin admin -- user promote chef@example.com
//! cargo run --bin admin -- user demote chef@example.com
//!
//! # Mark an email address as verified
//! cargo run --bin admin -- user verify chef@example.com
//!
//! # List or delete a user's tokens
//! cargo run --bin admin -- token list chef@example.com
//! cargo run --bin admin -- token truncate chef@example.com
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (or `DB_HOST`/`DB_USER`/...): PostgreSQL connection
//! - `TOKEN_SIGNING_SECRET`: required by the shared configuration loader

use cookbook_api::config;
use cookbook_api::domain::entities::{NewUser, User, UserPatch};
use cookbook_api::domain::query::{OrganizedQuery, PageRequest};
use cookbook_api::domain::repositories::{TokenRepository, UserRepository};
use cookbook_api::infrastructure::persistence::{PgTokenRepository, PgUserRepository};
use cookbook_api::server;
use cookbook_api::utils::password::hash_password_blocking;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input, Password};
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing cookbook-api.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Manage a user's tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a user
    Create {
        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        email: Option<String>,

        /// Grant the admin role
        #[arg(long)]
        admin: bool,

        /// Mark the email address as verified
        #[arg(long)]
        verified: bool,
    },

    /// Grant the admin role
    Promote { email: String },

    /// Remove the admin role
    Demote { email: String },

    /// Mark the email address as verified
    Verify { email: String },
}

#[derive(Subcommand)]
enum TokenAction {
    /// List tokens of a user
    List { email: String },

    /// Delete every token of a user
    Truncate {
        email: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

struct Repos {
    users: PgUserRepository,
    tokens: PgTokenRepository,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = config::load_from_env()?;
    let pool = server::connect(&config).await?;

    let shared = Arc::new(pool.clone());
    let repos = Repos {
        users: PgUserRepository::new(shared.clone()),
        tokens: PgTokenRepository::new(shared),
    };

    match cli.command {
        Commands::User { action } => handle_user_action(action, &repos).await?,
        Commands::Token { action } => handle_token_action(action, &repos).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

async fn find_user(repos: &Repos, email: &str) -> Result<User> {
    repos
        .users
        .find_by_email(email)
        .await?
        .with_context(|| format!("No user with email '{email}'"))
}

async fn handle_user_action(action: UserAction, repos: &Repos) -> Result<()> {
    match action {
        UserAction::Create {
            name,
            email,
            admin,
            verified,
        } => create_user(repos, name, email, admin, verified).await?,
        UserAction::Promote { email } => set_admin(repos, &email, true).await?,
        UserAction::Demote { email } => set_admin(repos, &email, false).await?,
        UserAction::Verify { email } => {
            let user = find_user(repos, &email).await?;
            if user.is_email_verified() {
                println!("{}", "⚠️  Email is already verified".yellow());
                return Ok(());
            }

            repos
                .users
                .update(
                    user.id,
                    UserPatch {
                        email_verified_at: Some(Some(Utc::now())),
                        ..UserPatch::default()
                    },
                )
                .await?;

            println!("{}", "✅ Email marked as verified".green().bold());
        }
    }

    Ok(())
}

/// Creates a user with interactive prompts for missing values.
///
/// The password is always read from the terminal and hashed with Argon2id.
async fn create_user(
    repos: &Repos,
    name: Option<String>,
    email: Option<String>,
    is_admin: bool,
    verified: bool,
) -> Result<()> {
    println!("{}", "👤 Create User".bright_blue().bold());
    println!();

    let name = match name {
        Some(n) => n,
        None => Input::new().with_prompt("Name").interact_text()?,
    };
    let email: String = match email {
        Some(e) => e,
        None => Input::new().with_prompt("Email").interact_text()?,
    };
    let password = Password::new()
        .with_prompt("Password")
        .with_confirmation("Repeat password", "Passwords do not match")
        .interact()?;

    if password.len() < 8 {
        return Err(anyhow!("Password must be at least 8 characters"));
    }

    let password_hash = hash_password_blocking(password).await?;

    let user = repos
        .users
        .create(NewUser {
            name,
            email,
            password_hash,
            is_admin,
            email_verified_at: verified.then(Utc::now),
        })
        .await
        .map_err(|e| anyhow!("Failed to create user: {e}"))?;

    println!();
    println!("{}", "✅ User created successfully!".green().bold());
    println!("  ID:    {}", user.id.to_string().bright_black());
    println!("  Email: {}", user.email.cyan());
    println!(
        "  Role:  {}",
        if user.is_admin { "admin".bright_yellow() } else { "user".normal() }
    );
    println!();

    Ok(())
}

/// Changes the admin role and deletes every session of the user.
async fn set_admin(repos: &Repos, email: &str, is_admin: bool) -> Result<()> {
    let user = find_user(repos, email).await?;

    if user.is_admin == is_admin {
        println!("{}", "⚠️  Nothing to change".yellow());
        return Ok(());
    }

    let (_, deleted) = repos
        .users
        .update_and_revoke_sessions(
            user.id,
            UserPatch {
                is_admin: Some(is_admin),
                ..UserPatch::default()
            },
        )
        .await?;

    let verb = if is_admin { "promoted" } else { "demoted" };
    println!("{}", format!("✅ User {verb}").green().bold());
    println!("  Sessions ended: {}", deleted.to_string().bright_white());

    Ok(())
}

async fn handle_token_action(action: TokenAction, repos: &Repos) -> Result<()> {
    match action {
        TokenAction::List { email } => list_tokens(repos, &email).await?,
        TokenAction::Truncate { email, yes } => {
            let user = find_user(repos, &email).await?;

            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Delete every token of {}?", user.email))
                    .default(false)
                    .interact()?;

                if !confirmed {
                    println!("{}", "❌ Cancelled".red());
                    return Ok(());
                }
            }

            let deleted = repos.tokens.delete_all_for_owner(user.id).await?;
            println!(
                "{}",
                format!("✅ Deleted {deleted} token(s)").green().bold()
            );
        }
    }

    Ok(())
}

/// Lists the newest 100 tokens of a user with status indicators.
///
/// # Output Format
///
/// ```text
/// 📋 Tokens of chef@example.com
///
///   ID   Kind     Group  Name              Created            Status
///   ──────────────────────────────────────────────────────────────────────
///   12   access   4      access_token      2024-01-15 10:30   ACTIVE
///   11   refresh  4      refresh_token     2024-01-15 10:30   REVOKED
/// ```
async fn list_tokens(repos: &Repos, email: &str) -> Result<()> {
    let user = find_user(repos, email).await?;

    println!(
        "{}",
        format!("📋 Tokens of {}", user.email).bright_blue().bold()
    );
    println!();

    let page = repos
        .tokens
        .list_for_owner(user.id, &OrganizedQuery::default(), PageRequest::new(1, 100))
        .await
        .map_err(|e| anyhow!("Failed to list tokens: {e}"))?;

    if page.items.is_empty() {
        println!("{}", "  No tokens found".yellow());
        return Ok(());
    }

    println!(
        "  {:<5} {:<8} {:<6} {:<17} {:<18} {}",
        "ID".bright_white().bold(),
        "Kind".bright_white().bold(),
        "Group".bright_white().bold(),
        "Name".bright_white().bold(),
        "Created".bright_white().bold(),
        "Status".bright_white().bold()
    );
    println!("  {}", "─".repeat(70).bright_black());

    for token in &page.items {
        let status = if token.is_revoked() {
            "REVOKED".red()
        } else if token.is_expired() {
            "EXPIRED".yellow()
        } else {
            "ACTIVE".green()
        };

        println!(
            "  {:<5} {:<8} {:<6} {:<17} {:<18} {}",
            token.id.to_string().bright_black(),
            token.kind.as_str(),
            token.group_id,
            token.name.cyan(),
            token
                .created_at
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .bright_black(),
            status
        );
    }

    println!();
    println!("  Total: {}", page.total.to_string().bright_white().bold());
    println!();

    Ok(())
}

async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;
            let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
                .fetch_one(pool)
                .await?;
            let live_tokens: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM auth_tokens \
                 WHERE revoked_at IS NULL AND (expires_at IS NULL OR expires_at > NOW())",
            )
            .fetch_one(pool)
            .await?;

            println!("  PostgreSQL:  {}", version.bright_white());
            println!("  Users:       {}", users.to_string().bright_green().bold());
            println!(
                "  Live tokens: {}",
                live_tokens.to_string().bright_green().bold()
            );
            println!();
        }
    }

    Ok(())
}
