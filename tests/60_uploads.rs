mod common;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::{json, Value};

use service_catalog::notify::LogNotifier;
use service_catalog::storage::{FirebaseStorage, MemoryBlobStore};

use common::{test_config, TestServer};

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nnot really a png";

fn image_form(bytes: &[u8], mime: &str) -> Result<Form> {
    let part = Part::bytes(bytes.to_vec()).file_name("photo").mime_str(mime)?;
    Ok(Form::new().part("file", part))
}

#[tokio::test]
async fn upload_stores_blob_and_versions_the_item() -> Result<()> {
    let blobs = Arc::new(MemoryBlobStore::new());
    let server = TestServer::spawn_with(test_config(), blobs.clone(), Arc::new(LogNotifier)).await?;
    let item = server.create_item(common::massage()).await?;
    let id = item["id"].as_str().unwrap_or_default().to_string();

    let resp = server
        .post(&format!("/api/v1/catalog-items/{}/image", id))
        .multipart(image_form(PNG, "image/png")?)
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let payload: Value = resp.json().await?;
    let object = &payload["data"]["object"];
    let path = object["path"].as_str().unwrap_or_default().to_string();
    assert!(path.starts_with(&format!("tenants/{}/live/catalog-items/{}/", server.tenant_id, id)));
    assert!(path.ends_with(".png"));
    assert_eq!(object["size"], PNG.len());
    assert_eq!(object["content_type"], "image/png");

    let updated = &payload["data"]["item"];
    assert_eq!(updated["version_number"], 2);
    assert_eq!(updated["image_url"], object["url"]);

    let stored = blobs.get(&path).await;
    assert_eq!(stored, Some(("image/png".to_string(), PNG.to_vec())));
    Ok(())
}

#[tokio::test]
async fn rejected_uploads_leave_nothing_behind() -> Result<()> {
    let blobs = Arc::new(MemoryBlobStore::new());
    let mut config = test_config();
    config.storage.max_upload_bytes = 1024;
    let server = TestServer::spawn_with(config, blobs.clone(), Arc::new(LogNotifier)).await?;
    let item = server.create_item(common::massage()).await?;
    let id = item["id"].as_str().unwrap_or_default().to_string();
    let url = format!("/api/v1/catalog-items/{}/image", id);

    let resp = server.post(&url).multipart(image_form(PNG, "application/pdf")?).send().await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let payload: Value = resp.json().await?;
    assert!(payload["field_errors"]["content_type"].is_string());

    let resp = server
        .post(&url)
        .multipart(image_form(&[0u8; 2048], "image/jpeg")?)
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let payload: Value = resp.json().await?;
    assert!(payload["field_errors"]["file"].is_string());

    let form = Form::new().text("caption", "no file here");
    let resp = server.post(&url).multipart(form).send().await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let payload: Value = resp.json().await?;
    assert!(payload["field_errors"]["file"].is_string());

    // Superseded versions are refused before anything is stored
    server
        .put(&format!("/api/v1/catalog-items/{}", id))
        .json(&json!({ "name": "Renamed" }))
        .send()
        .await?;
    let resp = server.post(&url).multipart(image_form(PNG, "image/png")?).send().await?;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    assert_eq!(blobs.len().await, 0);
    Ok(())
}

#[derive(Clone, Default)]
struct FakeFirebase {
    uploads: Arc<Mutex<Vec<(String, String, usize)>>>,
}

async fn fake_upload(
    State(fake): State<FakeFirebase>,
    Path(bucket): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Value> {
    let name = query.get("name").cloned().unwrap_or_default();
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if let Ok(mut uploads) = fake.uploads.lock() {
        uploads.push((format!("{}:{}", bucket, name), auth, body.len()));
    }
    Json(json!({ "name": name, "bucket": bucket, "downloadTokens": "tok-1,tok-2" }))
}

#[tokio::test]
async fn firebase_storage_receives_the_image() -> Result<()> {
    let fake = FakeFirebase::default();
    let firebase_url = common::serve(
        Router::new()
            .route("/v0/b/:bucket/o", post(fake_upload))
            .with_state(fake.clone()),
    )
    .await?;

    let storage = FirebaseStorage::new(&firebase_url, "catalog.appspot.com", "firebase-token")?;
    let server = TestServer::spawn_with(test_config(), Arc::new(storage), Arc::new(LogNotifier)).await?;
    let item = server.create_item(common::massage()).await?;
    let id = item["id"].as_str().unwrap_or_default().to_string();

    let resp = server
        .post(&format!("/api/v1/catalog-items/{}/image", id))
        .header("x-environment", "live")
        .multipart(image_form(PNG, "image/png")?)
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let payload: Value = resp.json().await?;
    let url = payload["data"]["item"]["image_url"].as_str().unwrap_or_default();
    assert!(url.starts_with(&format!("{}/v0/b/catalog.appspot.com/o/tenants%2F", firebase_url)));
    assert!(url.ends_with("?alt=media&token=tok-1"));

    let uploads = fake.uploads.lock().map(|u| u.clone()).unwrap_or_default();
    assert_eq!(uploads.len(), 1);
    let (name, auth, size) = &uploads[0];
    assert!(name.starts_with("catalog.appspot.com:tenants/"));
    assert_eq!(auth, "Bearer firebase-token");
    assert_eq!(*size, PNG.len());
    Ok(())
}
