//! End-to-end tests of the file API, pages and sign-out.

mod common;

use common::{ALICE, BOB, TestServer, error_message};
use reqwest::{Method, StatusCode, header};
use serde_json::Value;

#[tokio::test]
async fn api_requires_a_session() {
    let server = TestServer::start().await;

    let response = server.request(Method::GET, "/api/files").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_message(response).await, "Not authenticated");

    let response = server
        .request(Method::GET, "/api/files")
        .header(header::COOKIE, "session_token=forged.token.value")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_message(response).await, "Invalid or expired session");
}

#[tokio::test]
async fn upload_then_list() {
    let server = TestServer::start().await;
    let content = b"solid cube\nendsolid cube\n";

    let response = server.upload(ALICE, "", "part.stl", content).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Uploaded part.stl");
    assert_eq!(body["size"], content.len() as u64);

    let response = server.list(ALICE, "").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["path"], "");
    assert_eq!(body["user"]["email"], ALICE);

    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "part.stl");
    assert_eq!(items[0]["path"], "part.stl");
    assert_eq!(items[0]["is_dir"], false);
    assert_eq!(items[0]["is_stl"], true);
    assert_eq!(items[0]["size"], content.len() as u64);
    assert_eq!(items[0]["modified"].as_str().unwrap().len(), "2025-01-01 00:00".len());
}

#[tokio::test]
async fn listing_puts_folders_first() {
    let server = TestServer::start().await;
    assert_eq!(server.upload(ALICE, "", "b.txt", b"b").await.status(), StatusCode::OK);
    assert_eq!(server.upload(ALICE, "", "a.txt", b"a").await.status(), StatusCode::OK);

    let response = server.mkdir(ALICE, "", "Z").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Created folder Z");

    let body: Value = server.list(ALICE, "").await.json().await.unwrap();
    let names: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Z", "a.txt", "b.txt"]);
}

#[tokio::test]
async fn traversal_is_rejected_without_leaking_paths() {
    let server = TestServer::start().await;

    let response = server.list(ALICE, "../../etc/passwd").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let message = error_message(response).await;
    assert!(message.starts_with("Invalid path"));
    let root = server.storage_root();
    assert!(!message.contains(root.to_str().unwrap()));

    let response = server.upload(ALICE, "..", "evil.stl", b"x").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(!root.join("evil.stl").exists());
}

#[tokio::test]
async fn users_are_isolated() {
    let server = TestServer::start().await;
    server.upload(ALICE, "", "secret.stl", b"alice only").await;

    let body: Value = server.list(BOB, "").await.json().await.unwrap();
    assert!(body["items"].as_array().unwrap().is_empty());

    let response = server
        .as_user(BOB, Method::GET, "/api/files/download")
        .query(&[("path", "../alice_at_example_dot_com/secret.stl")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn download_returns_bytes_as_attachment() {
    let server = TestServer::start().await;
    server.mkdir(ALICE, "", "prints").await;
    server.upload(ALICE, "prints", "Gear.STL", b"gear bytes").await;

    let response = server
        .as_user(ALICE, Method::GET, "/api/files/download")
        .query(&[("path", "prints/Gear.STL")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "model/stl");
    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"Gear.STL\""));
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "10");
    assert_eq!(response.bytes().await.unwrap().as_ref(), b"gear bytes");

    let response = server
        .as_user(ALICE, Method::GET, "/api/files/download")
        .query(&[("path", "prints")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = server
        .as_user(ALICE, Method::GET, "/api/files/download")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(response).await, "Missing path parameter");
}

#[tokio::test]
async fn delete_files_and_folders() {
    let server = TestServer::start().await;

    let response = server
        .as_user(ALICE, Method::DELETE, "/api/files/delete")
        .query(&[("path", "missing/file.stl")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    server.mkdir(ALICE, "", "old").await;
    server.upload(ALICE, "old", "x.stl", b"x").await;
    let response = server
        .as_user(ALICE, Method::DELETE, "/api/files/delete")
        .query(&[("path", "old")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Deleted old");

    let body: Value = server.list(ALICE, "").await.json().await.unwrap();
    assert!(body["items"].as_array().unwrap().is_empty());

    let response = server
        .as_user(ALICE, Method::DELETE, "/api/files/delete")
        .query(&[("path", "/")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(response).await, "The root folder cannot be deleted");
}

#[tokio::test]
async fn listing_missing_folder_is_not_found() {
    let server = TestServer::start().await;
    let response = server.list(ALICE, "nowhere").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_message(response).await, "Not found: nowhere");
}

#[tokio::test]
async fn mkdir_inside_a_file_is_a_bad_request() {
    let server = TestServer::start().await;
    server.upload(ALICE, "", "model.stl", b"solid").await;

    let response = server.mkdir(ALICE, "", "model.stl/sub").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(response).await, "Not a directory: model.stl/sub");

    let response = server.upload(ALICE, "model.stl", "part.stl", b"x").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn index_redirects_signed_in_users() {
    let server = TestServer::start().await;

    let response = server.request(Method::GET, "/").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("Sign in with Google"));

    let response = server.as_user(ALICE, Method::GET, "/").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "/files");
}

#[tokio::test]
async fn pages_require_a_session() {
    let server = TestServer::start().await;

    for page in ["/files", "/terminal"] {
        let response = server.request(Method::GET, page).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = server.as_user(ALICE, Method::GET, page).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response.headers()[header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("text/html")
        );
    }
}

#[tokio::test]
async fn logout_clears_the_cookie() {
    let server = TestServer::start().await;
    let response = server
        .as_user(ALICE, Method::POST, "/auth/logout")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");
    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("session_token=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn google_login_redirects_to_consent_page() {
    let server = TestServer::with_config(|config| {
        config.auth.google_client_id = "client-abc".to_string();
    })
    .await;

    let response = server.request(Method::GET, "/auth/google").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = response.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
    assert!(location.contains("client_id=client-abc"));
}

#[tokio::test]
async fn static_assets_stay_inside_static_dir() {
    let server = TestServer::start().await;

    let response = server.request(Method::GET, "/static/style.css").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/css")
    );

    let response = server
        .request(Method::GET, "/static/..%2fCargo.toml")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = server.request(Method::GET, "/static/missing.js").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
