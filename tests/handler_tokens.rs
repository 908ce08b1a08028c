mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{Value, json};
use sqlx::PgPool;

use common::{PASSWORD, create_user, make_server};

async fn login(server: &TestServer, email: &str, agent: &str) -> Value {
    let response = server
        .post("/auth/login")
        .add_header("User-Agent", agent)
        .json(&json!({ "email": email, "password": PASSWORD }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

fn bearer(session: &Value) -> String {
    format!("Bearer {}", session["access_token"].as_str().unwrap())
}

#[sqlx::test]
async fn test_list_tokens_marks_current_session(pool: PgPool) {
    create_user(&pool, "ada@example.com", true, false).await;
    let server = make_server(pool);

    let phone = login(&server, "ada@example.com", "PhoneApp/1.0").await;
    login(&server, "ada@example.com", "Laptop/2.0").await;

    let response = server
        .get("/auth/tokens")
        .add_header("Authorization", bearer(&phone))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["pagination"]["total"], 4);

    let items = body["items"].as_array().unwrap();
    let current: Vec<&Value> = items.iter().filter(|t| t["current"] == true).collect();
    assert_eq!(current.len(), 2);
    assert!(current.iter().all(|t| t["user_agent"] == "PhoneApp/1.0"));
    assert!(items.iter().all(|t| t.get("token_hash").is_none()));
}

#[sqlx::test]
async fn test_list_tokens_filter_search_sort(pool: PgPool) {
    create_user(&pool, "ada@example.com", true, false).await;
    let server = make_server(pool);

    let phone = login(&server, "ada@example.com", "PhoneApp/1.0").await;
    login(&server, "ada@example.com", "Laptop/2.0").await;

    let refresh_only = server
        .get("/auth/tokens")
        .add_query_param("filter[kind]", "refresh")
        .add_query_param("unknown", "ignored")
        .add_header("Authorization", bearer(&phone))
        .await;
    refresh_only.assert_status_ok();
    let body: Value = refresh_only.json();
    assert_eq!(body["pagination"]["total"], 2);
    assert!(
        body["items"]
            .as_array()
            .unwrap()
            .iter()
            .all(|t| t["kind"] == "refresh")
    );

    let searched = server
        .get("/auth/tokens")
        .add_query_param("search", "laptop")
        .add_query_param("sort", "-kind")
        .add_header("Authorization", bearer(&phone))
        .await;
    let body: Value = searched.json();
    assert_eq!(body["pagination"]["total"], 2);
    assert_eq!(body["items"][0]["kind"], "refresh");
    assert_eq!(body["items"][1]["kind"], "access");
}

#[sqlx::test]
async fn test_list_tokens_rejects_bad_page_size(pool: PgPool) {
    create_user(&pool, "ada@example.com", true, false).await;
    let server = make_server(pool);
    let session = login(&server, "ada@example.com", "PhoneApp/1.0").await;

    server
        .get("/auth/tokens")
        .add_query_param("per_page", "1000")
        .add_header("Authorization", bearer(&session))
        .await
        .assert_status_bad_request();
}

#[sqlx::test]
async fn test_delete_other_session(pool: PgPool) {
    create_user(&pool, "ada@example.com", true, false).await;
    let server = make_server(pool);

    let phone = login(&server, "ada@example.com", "PhoneApp/1.0").await;
    let laptop = login(&server, "ada@example.com", "Laptop/2.0").await;

    let laptop_token_id: i64 = laptop["access_token"]
        .as_str()
        .unwrap()
        .split('.')
        .next()
        .unwrap()
        .parse()
        .unwrap();

    server
        .delete(&format!("/auth/tokens/{laptop_token_id}"))
        .add_header("Authorization", bearer(&phone))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    server
        .get("/users/me")
        .add_header("Authorization", bearer(&laptop))
        .await
        .assert_status_unauthorized();

    server
        .get("/users/me")
        .add_header("Authorization", bearer(&phone))
        .await
        .assert_status_ok();
}

#[sqlx::test]
async fn test_cannot_delete_someone_elses_token(pool: PgPool) {
    create_user(&pool, "ada@example.com", true, false).await;
    create_user(&pool, "bob@example.com", true, false).await;
    let server = make_server(pool);

    let ada = login(&server, "ada@example.com", "A").await;
    let bob = login(&server, "bob@example.com", "B").await;

    let bob_token_id = bob["access_token"]
        .as_str()
        .unwrap()
        .split('.')
        .next()
        .unwrap()
        .to_string();

    server
        .delete(&format!("/auth/tokens/{bob_token_id}"))
        .add_header("Authorization", bearer(&ada))
        .await
        .assert_status_not_found();

    server
        .get("/users/me")
        .add_header("Authorization", bearer(&bob))
        .await
        .assert_status_ok();
}

#[sqlx::test]
async fn test_truncate_tokens(pool: PgPool) {
    create_user(&pool, "ada@example.com", true, false).await;
    let server = make_server(pool);

    let phone = login(&server, "ada@example.com", "PhoneApp/1.0").await;
    let laptop = login(&server, "ada@example.com", "Laptop/2.0").await;

    server
        .delete("/auth/tokens")
        .add_header("Authorization", bearer(&phone))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    for session in [&phone, &laptop] {
        server
            .get("/users/me")
            .add_header("Authorization", bearer(session))
            .await
            .assert_status_unauthorized();
    }
}
