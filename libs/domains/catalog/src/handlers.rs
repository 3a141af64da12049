use axum::{
    Json, Router,
    body::Bytes,
    extract::{Multipart, Path, Query, State, multipart::MultipartRejection},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use axum_helpers::{
    AppError, UuidPath, ValidatedJson,
    errors::responses::{
        BadGatewayResponse, BadRequestResponse, BadRequestUuidResponse,
        BadRequestValidationResponse, ConflictResponse, InternalServerErrorResponse,
        NotFoundResponse, ServiceUnavailableResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::CatalogResult;
use crate::models::{
    DeleteItemResponse, ImageQuery, ItemSummary, SearchRequest, UpdateItemFields, UploadItemForm,
};
use crate::repository::CatalogRepository;
use crate::search::SearchService;
use crate::service::CatalogService;

/// Images are immutable under their blob id.
const IMAGE_CACHE_CONTROL: &str = "private, max-age=86400, immutable";

/// OpenAPI documentation for the catalog API
#[derive(OpenApi)]
#[openapi(
    paths(
        find_items,
        upload_item,
        get_item,
        update_item,
        delete_item,
        list_boxes,
        list_box_contents,
        fetch_image,
    ),
    components(
        schemas(ItemSummary, SearchRequest, UpdateItemFields, DeleteItemResponse, UploadItemForm),
        responses(
            BadRequestResponse,
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            NotFoundResponse,
            ConflictResponse,
            BadGatewayResponse,
            ServiceUnavailableResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Catalog", description = "Photographed inventory items, boxes and images")
    )
)]
pub struct ApiDoc;

struct CatalogApi<R: CatalogRepository> {
    catalog: CatalogService<R>,
    search: SearchService<R>,
}

/// Catalog routes, to be nested under `/catalog`.
pub fn router<R: CatalogRepository + 'static>(
    catalog: CatalogService<R>,
    search: SearchService<R>,
) -> Router {
    let state = Arc::new(CatalogApi { catalog, search });

    Router::new()
        .route("/search", post(find_items))
        .route("/items", post(upload_item))
        .route(
            "/items/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
        .route("/boxes", get(list_boxes))
        .route("/boxes/{box_id}/items", get(list_box_contents))
        .route("/images/{blob_id}", get(fetch_image))
        .with_state(state)
}

/// Find items by meaning
#[utoipa::path(
    post,
    path = "/search",
    tag = "Catalog",
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Closest items first", body = Vec<ItemSummary>),
        (status = 400, response = BadRequestResponse),
        (status = 502, response = BadGatewayResponse),
        (status = 503, response = ServiceUnavailableResponse)
    )
)]
async fn find_items<R: CatalogRepository>(
    State(api): State<Arc<CatalogApi<R>>>,
    ValidatedJson(request): ValidatedJson<SearchRequest>,
) -> CatalogResult<Json<Vec<ItemSummary>>> {
    let items = api
        .search
        .find_items(&request.query, request.count)
        .await?;
    Ok(Json(items))
}

/// Upload a photo into a box
#[utoipa::path(
    post,
    path = "/items",
    tag = "Catalog",
    request_body(content = UploadItemForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Item catalogued", body = ItemSummary),
        (status = 400, response = BadRequestResponse),
        (status = 502, response = BadGatewayResponse),
        (status = 503, response = ServiceUnavailableResponse)
    )
)]
async fn upload_item<R: CatalogRepository>(
    State(api): State<Arc<CatalogApi<R>>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    let mut multipart = multipart?;
    let mut file: Option<(Bytes, Option<String>)> = None;
    let mut box_id: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let content_type = field.content_type().map(str::to_string);
                file = Some((field.bytes().await?, content_type));
            }
            Some("boxId") => box_id = Some(field.text().await?),
            _ => {}
        }
    }

    let (image, content_type) = file
        .ok_or_else(|| AppError::BadRequest("multipart field 'file' is required".to_string()))?;
    let box_id = box_id
        .ok_or_else(|| AppError::BadRequest("multipart field 'boxId' is required".to_string()))?;

    let item = api
        .catalog
        .ingest(image, content_type.as_deref(), &box_id)
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Get an item by ID
#[utoipa::path(
    get,
    path = "/items/{id}",
    tag = "Catalog",
    params(
        ("id" = Uuid, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Item found", body = ItemSummary),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_item<R: CatalogRepository>(
    State(api): State<Arc<CatalogApi<R>>>,
    UuidPath(id): UuidPath,
) -> CatalogResult<Json<ItemSummary>> {
    Ok(Json(api.catalog.get_item(id).await?))
}

/// Update the owner description and count
#[utoipa::path(
    put,
    path = "/items/{id}",
    tag = "Catalog",
    params(
        ("id" = Uuid, Path, description = "Item ID")
    ),
    request_body = UpdateItemFields,
    responses(
        (status = 200, description = "Item updated", body = ItemSummary),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 502, response = BadGatewayResponse)
    )
)]
async fn update_item<R: CatalogRepository>(
    State(api): State<Arc<CatalogApi<R>>>,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateItemFields>,
) -> CatalogResult<Json<ItemSummary>> {
    Ok(Json(api.catalog.update_user_fields(id, input).await?))
}

/// Delete an item with its image and thumbnail
#[utoipa::path(
    delete,
    path = "/items/{id}",
    tag = "Catalog",
    params(
        ("id" = Uuid, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Item deleted", body = DeleteItemResponse),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn delete_item<R: CatalogRepository>(
    State(api): State<Arc<CatalogApi<R>>>,
    UuidPath(id): UuidPath,
) -> CatalogResult<Json<DeleteItemResponse>> {
    let deleted = api.catalog.delete_item(id).await?;
    Ok(Json(DeleteItemResponse { deleted }))
}

/// List every box that holds at least one item
#[utoipa::path(
    get,
    path = "/boxes",
    tag = "Catalog",
    responses(
        (status = 200, description = "Box ids, sorted", body = Vec<String>),
        (status = 503, response = ServiceUnavailableResponse)
    )
)]
async fn list_boxes<R: CatalogRepository>(
    State(api): State<Arc<CatalogApi<R>>>,
) -> CatalogResult<Json<Vec<String>>> {
    Ok(Json(api.catalog.list_boxes().await?))
}

/// List the items in one box
#[utoipa::path(
    get,
    path = "/boxes/{box_id}/items",
    tag = "Catalog",
    params(
        ("box_id" = String, Path, description = "Box ID")
    ),
    responses(
        (status = 200, description = "Items in the box", body = Vec<ItemSummary>),
        (status = 503, response = ServiceUnavailableResponse)
    )
)]
async fn list_box_contents<R: CatalogRepository>(
    State(api): State<Arc<CatalogApi<R>>>,
    Path(box_id): Path<String>,
) -> CatalogResult<Json<Vec<ItemSummary>>> {
    Ok(Json(api.catalog.list_box_contents(&box_id).await?))
}

/// Download an item image or its thumbnail
#[utoipa::path(
    get,
    path = "/images/{blob_id}",
    tag = "Catalog",
    params(
        ("blob_id" = String, Path, description = "Blob ID from the item"),
        ImageQuery
    ),
    responses(
        (status = 200, description = "Image bytes", content_type = "application/octet-stream", body = Vec<u8>),
        (status = 400, response = BadRequestResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn fetch_image<R: CatalogRepository>(
    State(api): State<Arc<CatalogApi<R>>>,
    Path(blob_id): Path<String>,
    Query(query): Query<ImageQuery>,
) -> CatalogResult<impl IntoResponse> {
    let blob = api.catalog.fetch_image(&blob_id, query.thumb).await?;
    Ok((
        [
            (header::CONTENT_TYPE, blob.content_type),
            (header::CACHE_CONTROL, IMAGE_CACHE_CONTROL.to_string()),
        ],
        blob.bytes,
    ))
}
