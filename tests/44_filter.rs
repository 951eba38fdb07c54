mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::TestServer;

// Listing surface of /api/v1/catalog-items: filters, sort and pagination

async fn seed(server: &TestServer) -> Result<()> {
    server.create_item(common::massage()).await?;
    server
        .create_item(json!({
            "name": "Argan Hair Oil",
            "description": "Cold pressed, 50% off this month",
            "item_type": "product",
            "category": "retail",
            "sku": "RET-OIL",
            "pricing_type": "per_unit",
            "unit_price": "12.50",
            "status": "active"
        }))
        .await?;
    server
        .create_item(json!({
            "name": "Bridal Package",
            "item_type": "package",
            "category": "wellness",
            "pricing_type": "fixed",
            "unit_price": "250",
            "status": "draft"
        }))
        .await?;
    Ok(())
}

async fn list(server: &TestServer, query: &str) -> Result<(StatusCode, Value)> {
    let resp = server.get(&format!("/api/v1/catalog-items{}", query)).send().await?;
    let status = resp.status();
    Ok((status, resp.json().await?))
}

fn names(payload: &Value) -> Vec<String> {
    payload["data"]["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|i| i["name"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn default_listing_is_newest_first() -> Result<()> {
    let server = TestServer::spawn().await?;
    seed(&server).await?;

    let (status, payload) = list(&server, "").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["data"]["total"], 3);
    assert_eq!(payload["data"]["page"], 1);
    assert_eq!(payload["data"]["per_page"], server.config.filter.default_limit);
    assert_eq!(
        names(&payload),
        vec!["Bridal Package", "Argan Hair Oil", "Deep Tissue Massage"]
    );
    Ok(())
}

#[tokio::test]
async fn field_filters_combine() -> Result<()> {
    let server = TestServer::spawn().await?;
    seed(&server).await?;

    let (_, payload) = list(&server, "?category=wellness&status=active").await?;
    assert_eq!(names(&payload), vec!["Deep Tissue Massage"]);

    let (_, payload) = list(&server, "?item_type=PACKAGE").await?;
    assert_eq!(names(&payload), vec!["Bridal Package"]);

    let (_, payload) = list(&server, "?min_price=10&max_price=50&sort=unit_price:desc").await?;
    assert_eq!(names(&payload), vec!["Deep Tissue Massage", "Argan Hair Oil"]);

    // Blank parameters are ignored
    let (status, payload) = list(&server, "?item_type=&category=").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["data"]["total"], 3);
    Ok(())
}

#[tokio::test]
async fn search_is_case_insensitive_and_literal() -> Result<()> {
    let server = TestServer::spawn().await?;
    seed(&server).await?;

    let (_, payload) = list(&server, "?search=TISSUE").await?;
    assert_eq!(names(&payload), vec!["Deep Tissue Massage"]);

    let (_, payload) = list(&server, "?search=ret-oil").await?;
    assert_eq!(names(&payload), vec!["Argan Hair Oil"]);

    // `%` is matched literally, not as a wildcard
    let (_, payload) = list(&server, "?search=50%25").await?;
    assert_eq!(names(&payload), vec!["Argan Hair Oil"]);
    let (_, payload) = list(&server, "?search=%25").await?;
    assert_eq!(names(&payload), vec!["Argan Hair Oil"]);
    Ok(())
}

#[tokio::test]
async fn sort_and_pagination() -> Result<()> {
    let server = TestServer::spawn().await?;
    seed(&server).await?;

    let (_, payload) = list(&server, "?sort=name&per_page=2").await?;
    assert_eq!(names(&payload), vec!["Argan Hair Oil", "Bridal Package"]);
    assert_eq!(payload["data"]["total"], 3);
    assert_eq!(payload["data"]["total_pages"], 2);

    let (_, payload) = list(&server, "?sort=name&per_page=2&page=2").await?;
    assert_eq!(names(&payload), vec!["Deep Tissue Massage"]);

    let (_, payload) = list(&server, "?sort=name&page=5").await?;
    assert!(names(&payload).is_empty());
    assert_eq!(payload["data"]["total"], 3);

    let (status, payload) = list(&server, "?per_page=100000").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["data"]["per_page"], server.config.filter.max_limit);
    Ok(())
}

#[tokio::test]
async fn invalid_listing_parameters_are_rejected() -> Result<()> {
    let server = TestServer::spawn().await?;

    for query in [
        "?sort=tenant_id",
        "?sort=name:sideways",
        "?page=0",
        "?per_page=0",
        "?min_price=50&max_price=10",
        "?min_price=-1",
        "?page=abc",
    ] {
        let (status, payload) = list(&server, query).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "query {} gave {}", query, payload);
        assert_eq!(payload["error"], true);
    }

    let (status, payload) = list(&server, "?item_type=spaceship&min_price=cheap").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(payload["code"], "VALIDATION_ERROR");
    assert!(payload["field_errors"]["item_type"].is_string());
    assert!(payload["field_errors"]["min_price"].is_string());
    Ok(())
}
