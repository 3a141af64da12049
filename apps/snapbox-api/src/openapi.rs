//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Combined OpenAPI documentation for all APIs
#[derive(OpenApi)]
#[openapi(
    info(
        title = "SnapBox API",
        version = "0.1.0",
        description = "Photograph what goes into a box, then find it again by describing it",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    nest(
        (path = "/api/catalog", api = domain_catalog::ApiDoc)
    ),
    tags(
        (name = "Catalog", description = "Item upload, search, editing and image download")
    )
)]
pub struct ApiDoc;
