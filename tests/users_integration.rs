use fastblog::configuration::{get_configuration, DatabaseSettings};
use fastblog::startup::run;
use serde_json::{json, Value};
use sqlx::{Connection, Executor, PgConnection, PgPool};
use std::net::TcpListener;

pub struct TestApp {
    pub address: String,
    pub db_pool: PgPool,
}

async fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let mut configuration = get_configuration().expect("Failed to read configuration.");
    configuration.database.database_name = uuid::Uuid::new_v4().to_string();
    let connection_pool = configure_database(&configuration.database).await;

    let server = run(listener, connection_pool.clone(), configuration.jwt.clone())
        .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        db_pool: connection_pool,
    }
}

pub async fn configure_database(config: &DatabaseSettings) -> PgPool {
    let mut connection = PgConnection::connect(&config.connection_string_without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, config.database_name))
        .await
        .expect("Failed to create database.");

    let connection_pool = PgPool::connect(&config.connection_string())
        .await
        .expect("Failed to connect to Postgres.");
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate the database.");
    connection_pool
}

/// Registers a user and returns (user id, access token).
async fn register_user(
    client: &reqwest::Client,
    address: &str,
    username: &str,
    email: &str,
) -> (i64, String) {
    let response = client
        .post(&format!("{}/auth/register", address))
        .json(&json!({
            "username": username,
            "email": email,
            "password": "Aa1$aaaa",
            "confirm_password": "Aa1$aaaa",
        }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(201, response.status().as_u16());

    let body: Value = response.json().await.expect("Failed to parse response");
    let token = body["access_token"].as_str().unwrap().to_string();

    // the subject of the token is the user id
    let users: Value = client
        .get(&format!("{}/users", address))
        .send()
        .await
        .expect("Failed to execute request.")
        .json()
        .await
        .expect("Failed to parse response");
    let user_id = users
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["username"] == username)
        .expect("Registered user missing from listing")["id"]
        .as_i64()
        .unwrap();

    (user_id, token)
}

async fn create_post(client: &reqwest::Client, address: &str, token: &str, title: &str) {
    let response = client
        .post(&format!("{}/posts", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "title": title, "text": "body" }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(201, response.status().as_u16());
}

#[tokio::test]
async fn get_user_returns_profile_without_private_fields() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let (user_id, _) = register_user(&client, &app.address, "grisha", "a@x.com").await;

    let response = client
        .get(&format!("{}/users/{}", &app.address, user_id))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["username"], "grisha");
    assert_eq!(body["email"], "a@x.com");
    assert_eq!(body["is_active"], true);
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn get_user_with_posts_nests_their_posts() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let (user_id, token) = register_user(&client, &app.address, "grisha", "a@x.com").await;
    create_post(&client, &app.address, &token, "One").await;
    create_post(&client, &app.address, &token, "Two").await;

    let response = client
        .get(&format!("{}/users/{}/posts", &app.address, user_id))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["username"], "grisha");
    assert_eq!(body["posts"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn update_username_requires_ownership() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let (user_id, _) = register_user(&client, &app.address, "grisha", "a@x.com").await;
    let (_, other_token) = register_user(&client, &app.address, "intruder", "b@x.com").await;

    let response = client
        .patch(&format!("{}/users/{}/username", &app.address, user_id))
        .header("Authorization", format!("Bearer {}", other_token))
        .json(&json!({ "username": "hijacked" }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(403, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], "PERMISSION_DENIED");
}

#[tokio::test]
async fn owner_can_update_username() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let (user_id, token) = register_user(&client, &app.address, "grisha", "a@x.com").await;

    let response = client
        .patch(&format!("{}/users/{}/username", &app.address, user_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "username": "grigoriy" }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["username"], "grigoriy");
}

#[tokio::test]
async fn change_password_verifies_old_password_and_policy() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let (user_id, token) = register_user(&client, &app.address, "grisha", "a@x.com").await;

    // wrong old password
    let response = client
        .patch(&format!("{}/users/{}/password", &app.address, user_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "password": "Wrong1$aa",
            "new_password": "Bb2$bbbb",
            "confirm_password": "Bb2$bbbb",
        }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(401, response.status().as_u16());

    // weak new password
    let response = client
        .patch(&format!("{}/users/{}/password", &app.address, user_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "password": "Aa1$aaaa",
            "new_password": "weakpassword",
            "confirm_password": "weakpassword",
        }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(400, response.status().as_u16());

    // valid change
    let response = client
        .patch(&format!("{}/users/{}/password", &app.address, user_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "password": "Aa1$aaaa",
            "new_password": "Bb2$bbbb",
            "confirm_password": "Bb2$bbbb",
        }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    // the new password logs in, the old one does not
    let response = client
        .post(&format!("{}/auth/login", &app.address))
        .form(&[("username", "a@x.com"), ("password", "Bb2$bbbb")])
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    let response = client
        .post(&format!("{}/auth/login", &app.address))
        .form(&[("username", "a@x.com"), ("password", "Aa1$aaaa")])
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn deactivation_deletes_only_owner_posts_and_flags_account() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let (a_id, a_token) = register_user(&client, &app.address, "grisha", "a@x.com").await;
    let (_b_id, b_token) = register_user(&client, &app.address, "bystander", "b@x.com").await;

    create_post(&client, &app.address, &a_token, "A post").await;
    create_post(&client, &app.address, &b_token, "B post").await;

    let response = client
        .patch(&format!("{}/users/{}/deactivate", &app.address, a_id))
        .header("Authorization", format!("Bearer {}", a_token))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    // A's posts are gone, B's remain
    let posts: Value = client
        .get(&format!("{}/posts", &app.address))
        .send()
        .await
        .expect("Failed to execute request.")
        .json()
        .await
        .expect("Failed to parse response");
    let posts = posts.as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["author"], "bystander");

    // the account is flagged, not removed
    let (is_active,): (bool,) =
        sqlx::query_as("SELECT is_active FROM users WHERE username = 'grisha'")
            .fetch_one(&app.db_pool)
            .await
            .expect("Deactivated user row must still exist");
    assert!(!is_active);

    // and no longer served
    let response = client
        .get(&format!("{}/users/{}", &app.address, a_id))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(403, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], "ACCOUNT_INACTIVE");
}

#[tokio::test]
async fn deactivate_requires_ownership() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let (a_id, _) = register_user(&client, &app.address, "grisha", "a@x.com").await;
    let (_, other_token) = register_user(&client, &app.address, "intruder", "b@x.com").await;

    let response = client
        .patch(&format!("{}/users/{}/deactivate", &app.address, a_id))
        .header("Authorization", format!("Bearer {}", other_token))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(403, response.status().as_u16());
}

#[tokio::test]
async fn deactivated_user_cannot_refresh() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let (user_id, token) = register_user(&client, &app.address, "grisha", "a@x.com").await;

    // grab a refresh cookie before deactivation
    let login = client
        .post(&format!("{}/auth/login", &app.address))
        .form(&[("username", "a@x.com"), ("password", "Aa1$aaaa")])
        .send()
        .await
        .expect("Failed to execute request.");
    let refresh_token = login
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("user_refresh_token="))
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim_start_matches("user_refresh_token=").to_string())
        .expect("No refresh cookie set");

    let response = client
        .patch(&format!("{}/users/{}/deactivate", &app.address, user_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    let response = client
        .post(&format!("{}/auth/refresh", &app.address))
        .header("Cookie", format!("user_refresh_token={}", refresh_token))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(403, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], "ACCOUNT_INACTIVE");
}

#[tokio::test]
async fn listing_users_excludes_deactivated_accounts() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let (a_id, a_token) = register_user(&client, &app.address, "grisha", "a@x.com").await;
    register_user(&client, &app.address, "bystander", "b@x.com").await;

    client
        .patch(&format!("{}/users/{}/deactivate", &app.address, a_id))
        .header("Authorization", format!("Bearer {}", a_token))
        .send()
        .await
        .expect("Failed to execute request.");

    let users: Value = client
        .get(&format!("{}/users", &app.address))
        .send()
        .await
        .expect("Failed to execute request.")
        .json()
        .await
        .expect("Failed to parse response");
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["username"], "bystander");
}
