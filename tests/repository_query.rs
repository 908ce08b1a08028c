mod common;

use cookbook_api::domain::entities::{AuthToken, TokenKind, User};
use cookbook_api::domain::query::{PageRequest, organize};
use cookbook_api::domain::repositories::{TokenRepository, UserRepository};
use cookbook_api::infrastructure::persistence::{PgTokenRepository, PgUserRepository};
use sqlx::PgPool;
use std::sync::Arc;

use common::{create_user, new_token};

fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Creates three sessions for `owner`: "phone" and "laptop" live, "tablet" revoked.
async fn seed_tokens(pool: &PgPool, owner: &User) -> PgTokenRepository {
    let repo = PgTokenRepository::new(Arc::new(pool.clone()));

    for name in ["phone", "laptop", "tablet"] {
        let group = repo.next_group_id().await.unwrap();
        let token = repo
            .create(new_token(
                TokenKind::Access,
                owner.id,
                group,
                name,
                &format!("hash-{name}"),
                None,
            ))
            .await
            .unwrap();

        if name == "tablet" {
            repo.revoke(token.id).await.unwrap();
        }
    }

    repo
}

async fn token_names(repo: &PgTokenRepository, owner: &User, pairs: &[(&str, &str)]) -> Vec<String> {
    let query = organize::<AuthToken>(&params(pairs));
    let page = repo
        .list_for_owner(owner.id, &query, PageRequest::new(1, 100))
        .await
        .unwrap();

    let mut names: Vec<String> = page.items.into_iter().map(|t| t.name).collect();
    names.sort();
    names
}

#[sqlx::test]
async fn test_unknown_filter_is_ignored(pool: PgPool) {
    let owner = create_user(&pool, "allow@example.com", true, false).await;
    let repo = seed_tokens(&pool, &owner).await;

    let all = token_names(&repo, &owner, &[]).await;
    let filtered = token_names(
        &repo,
        &owner,
        &[("filter[token_hash]", "hash-phone"), ("filter[owner_id][gt]", "0")],
    )
    .await;

    assert_eq!(all, filtered);
    assert_eq!(all.len(), 3);
}

#[sqlx::test]
async fn test_null_filter_selects_null_rows(pool: PgPool) {
    let owner = create_user(&pool, "null@example.com", true, false).await;
    let repo = seed_tokens(&pool, &owner).await;

    let live = token_names(&repo, &owner, &[("filter[revoked_at]", "\0")]).await;
    assert_eq!(live, vec!["laptop", "phone"]);

    let revoked = token_names(&repo, &owner, &[("filter[revoked_at][not]", "\0")]).await;
    assert_eq!(revoked, vec!["tablet"]);
}

#[sqlx::test]
async fn test_operators(pool: PgPool) {
    let owner = create_user(&pool, "ops@example.com", true, false).await;
    let repo = seed_tokens(&pool, &owner).await;

    assert_eq!(
        token_names(&repo, &owner, &[("filter[name]", "phone")]).await,
        vec!["phone"]
    );
    assert_eq!(
        token_names(&repo, &owner, &[("filter[name][not]", "phone")]).await,
        vec!["laptop", "tablet"]
    );
    assert_eq!(
        token_names(&repo, &owner, &[("filter[name][in]", "phone,tablet")]).await,
        vec!["phone", "tablet"]
    );
    assert_eq!(
        token_names(&repo, &owner, &[("filter[name][notin]", "phone,tablet")]).await,
        vec!["laptop"]
    );
    assert_eq!(
        token_names(&repo, &owner, &[("filter[name][like]", "%a%")]).await,
        vec!["laptop", "tablet"]
    );
    assert_eq!(
        token_names(&repo, &owner, &[("filter[kind]", "refresh")]).await,
        Vec::<String>::new()
    );
}

#[sqlx::test]
async fn test_search_escapes_wildcards(pool: PgPool) {
    let owner = create_user(&pool, "search@example.com", true, false).await;
    let repo = seed_tokens(&pool, &owner).await;

    assert_eq!(
        token_names(&repo, &owner, &[("search", "LAP")]).await,
        vec!["laptop"]
    );
    assert!(token_names(&repo, &owner, &[("search", "%")]).await.is_empty());
}

#[sqlx::test]
async fn test_list_is_scoped_to_owner(pool: PgPool) {
    let owner = create_user(&pool, "mine@example.com", true, false).await;
    let other = create_user(&pool, "theirs@example.com", true, false).await;
    let repo = seed_tokens(&pool, &owner).await;

    assert!(token_names(&repo, &other, &[]).await.is_empty());
}

#[sqlx::test]
async fn test_pagination(pool: PgPool) {
    let owner = create_user(&pool, "pages@example.com", true, false).await;
    let repo = seed_tokens(&pool, &owner).await;

    let query = organize::<AuthToken>(&params(&[("sort", "name")]));
    let page = repo
        .list_for_owner(owner.id, &query, PageRequest::new(2, 2))
        .await
        .unwrap();

    assert_eq!(page.total, 3);
    assert_eq!(page.total_pages(), 2);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].name, "tablet");
}

#[sqlx::test]
async fn test_sort_descending_then_ascending(pool: PgPool) {
    for (name, email, days_ago) in [
        ("Bea", "bea@example.com", 1),
        ("Abe", "abe@example.com", 1),
        ("Cid", "cid@example.com", 3),
        ("Dot", "dot@example.com", 0),
    ] {
        let user = create_user(&pool, email, true, false).await;
        sqlx::query(
            "UPDATE users SET name = $1, \
             created_at = date_trunc('day', NOW()) - make_interval(days => $2) \
             WHERE id = $3",
        )
        .bind(name)
        .bind(days_ago)
        .bind(user.id)
        .execute(&pool)
        .await
        .unwrap();
    }

    let repo = PgUserRepository::new(Arc::new(pool));
    let query = organize::<User>(&params(&[("sort", "-created_at,name")]));
    let page = repo.list(&query, PageRequest::new(1, 25)).await.unwrap();

    let names: Vec<&str> = page.items.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["Dot", "Abe", "Bea", "Cid"]);
}

#[sqlx::test]
async fn test_user_boolean_filter(pool: PgPool) {
    create_user(&pool, "admin@example.com", true, true).await;
    create_user(&pool, "cook@example.com", false, false).await;

    let repo = PgUserRepository::new(Arc::new(pool));

    let admins = repo
        .list(
            &organize::<User>(&params(&[("filter[is_admin]", "true")])),
            PageRequest::new(1, 25),
        )
        .await
        .unwrap();
    assert_eq!(admins.total, 1);
    assert_eq!(admins.items[0].email, "admin@example.com");

    let unverified = repo
        .list(
            &organize::<User>(&params(&[("filter[email_verified_at]", "\0")])),
            PageRequest::new(1, 25),
        )
        .await
        .unwrap();
    assert_eq!(unverified.total, 1);
    assert_eq!(unverified.items[0].email, "cook@example.com");
}
