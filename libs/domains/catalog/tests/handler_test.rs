//! Handler tests for the catalog domain
//!
//! These drive the catalog router directly with in-memory stores and a
//! deterministic provider; no network or database is involved.

mod common;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use bytes::Bytes;
use common::{Harness, harness, png};
use domain_catalog::models::DeleteItemResponse;
use domain_catalog::{ItemSummary, handlers};
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt; // For oneshot()

const BOUNDARY: &str = "catalog-test-boundary";

fn app(h: &Harness) -> Router {
    handlers::router(h.catalog.clone(), h.search.clone())
}

async fn body_bytes(body: Body) -> Bytes {
    body.collect().await.unwrap().to_bytes()
}

async fn json_body<T: serde::de::DeserializeOwned>(body: Body) -> T {
    serde_json::from_slice(&body_bytes(body).await).unwrap()
}

fn upload_request(image: &[u8], box_id: Option<&str>) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"photo.png\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(image);
    body.extend_from_slice(b"\r\n");
    if let Some(box_id) = box_id {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"boxId\"\r\n\r\n{box_id}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/items")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn json_request(method: &str, uri: &str, value: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(value.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn upload(h: &Harness, box_id: &str) -> ItemSummary {
    let response = app(h)
        .oneshot(upload_request(&png(30, 30), Some(box_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response.into_body()).await
}

#[tokio::test]
async fn test_upload_returns_201_with_summary() {
    let h = harness();
    h.gateway
        .queue("Lamp", "lighting", "A desk lamp.", &["black"]);

    let item = upload(&h, "B7").await;
    assert_eq!(item.title, "Lamp");
    assert_eq!(item.box_id.as_deref(), Some("B7"));
    assert_eq!(item.item_type, "component");
    assert_eq!(h.repository.len().await, 1);
}

#[tokio::test]
async fn test_upload_serializes_camel_case() {
    let h = harness();
    let response = app(&h)
        .oneshot(upload_request(&png(4, 4), Some("B1")))
        .await
        .unwrap();
    let value: serde_json::Value = json_body(response.into_body()).await;

    assert!(value.get("blobId").is_some());
    assert!(value.get("detailedDescription").is_some());
    assert_eq!(value["type"], "component");
    assert!(value.get("titleEmbedding").is_none());
    assert!(value.get("partitionKey").is_none());
}

#[tokio::test]
async fn test_upload_without_box_is_400() {
    let h = harness();
    let response = app(&h)
        .oneshot(upload_request(&png(4, 4), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_empty_file_is_400() {
    let h = harness();
    let response = app(&h)
        .oneshot(upload_request(&[], Some("B1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(h.blobs.is_empty().await);
}

#[tokio::test]
async fn test_search_returns_ranked_items() {
    let h = harness();
    h.gateway
        .queue("Garden hose", "tools", "Green rubber hose.", &["green"]);
    h.gateway
        .queue("Toaster", "appliances", "A two-slot toaster.", &["silver"]);
    let hose = upload(&h, "B1").await;
    upload(&h, "B1").await;

    let response = app(&h)
        .oneshot(json_request(
            "POST",
            "/search",
            json!({ "query": "rubber hose", "count": 1 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let items: Vec<ItemSummary> = json_body(response.into_body()).await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, hose.id);
}

#[tokio::test]
async fn test_search_with_zero_count_is_400() {
    let h = harness();
    let response = app(&h)
        .oneshot(json_request("POST", "/search", json!({ "query": "x", "count": 0 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_item_invalid_uuid_is_400() {
    let h = harness();
    let response = app(&h).oneshot(get("/items/not-a-uuid")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_missing_item_is_404() {
    let h = harness();
    let response = app(&h)
        .oneshot(get(&format!("/items/{}", uuid::Uuid::new_v4())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_item_handler() {
    let h = harness();
    let item = upload(&h, "B1").await;

    let response = app(&h)
        .oneshot(json_request(
            "PUT",
            &format!("/items/{}", item.id),
            json!({ "userDescription": "spare", "count": 4 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let updated: ItemSummary = json_body(response.into_body()).await;
    assert_eq!(updated.user_description.as_deref(), Some("spare"));
    assert_eq!(updated.count, 4.0);
    assert_eq!(updated.version, item.version + 1);
}

#[tokio::test]
async fn test_update_negative_count_is_400() {
    let h = harness();
    let item = upload(&h, "B1").await;

    let response = app(&h)
        .oneshot(json_request(
            "PUT",
            &format!("/items/{}", item.id),
            json!({ "count": -1 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_stale_version_is_409() {
    let h = harness();
    let item = upload(&h, "B1").await;

    let response = app(&h)
        .oneshot(json_request(
            "PUT",
            &format!("/items/{}", item.id),
            json!({ "count": 2, "expectedVersion": 99 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_delete_then_404() {
    let h = harness();
    let item = upload(&h, "B1").await;
    let uri = format!("/items/{}", item.id);

    let delete = || {
        Request::builder()
            .method("DELETE")
            .uri(uri.as_str())
            .body(Body::empty())
            .unwrap()
    };

    let response = app(&h).oneshot(delete()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: DeleteItemResponse = json_body(response.into_body()).await;
    assert!(body.deleted);

    let response = app(&h).oneshot(delete()).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_boxes_listing() {
    let h = harness();
    upload(&h, "B2").await;
    upload(&h, "B1").await;

    let response = app(&h).oneshot(get("/boxes")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let boxes: Vec<String> = json_body(response.into_body()).await;
    assert_eq!(boxes, vec!["B1", "B2"]);

    let response = app(&h).oneshot(get("/boxes/B2/items")).await.unwrap();
    let items: Vec<ItemSummary> = json_body(response.into_body()).await;
    assert_eq!(items.len(), 1);
}

#[tokio::test]
async fn test_image_is_served_with_content_type() {
    let h = harness();
    let item = upload(&h, "B1").await;
    let blob_id = item.blob_id.unwrap();

    let response = app(&h)
        .oneshot(get(&format!("/images/{}", blob_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert!(response.headers().contains_key(header::CACHE_CONTROL));
    assert_eq!(body_bytes(response.into_body()).await, png(30, 30));

    let response = app(&h)
        .oneshot(get(&format!("/images/{}?thumb=true", blob_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let thumb = image::load_from_memory(&body_bytes(response.into_body()).await).unwrap();
    assert_eq!(thumb.width(), 6);
}

#[tokio::test]
async fn test_missing_image_is_404() {
    let h = harness();
    let response = app(&h).oneshot(get("/images/nothing.png")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
