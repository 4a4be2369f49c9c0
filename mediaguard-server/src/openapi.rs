//! OpenAPI documentation configuration
//!
//! Generates the OpenAPI 3 document served at `/api-docs/openapi.json`.

use utoipa::OpenApi;

use crate::handlers::{
    AlgorithmEntry, AlgorithmListResponse, DigestQueryRequest, FileResponse, HashAlgorithmConfig,
    HashConfig, HashResponse, HealthResponse, MediaQueryConfig, OriginResponse, ReadyResponse,
    SimilarityMatch, WatermarkConfig, WatermarkHistoryItem, WatermarkResponse,
};

/// MediaGuard API - OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "MediaGuard API",
        version = "0.1.0",
        description = r#"
## Content Identification API

MediaGuard answers "have I seen this media before?":

- **Hashing** registers media under a stable identity and stores one digest per algorithm
- **Query** resolves media or raw digests back to known identities
- **Watermarking** embeds payloads and keeps a history per identity

Media is sent as the `media` field of a multipart form, or as a
`playlist_url` that the server downloads.
"#,
        license(name = "MIT OR Apache-2.0")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    tags(
        (name = "Hashing", description = "Register media and compute digests"),
        (name = "Query", description = "Find known content by media or digest"),
        (name = "Files", description = "Content records"),
        (name = "Watermarking", description = "Embed, read and trace watermarks"),
        (name = "Health", description = "Service health and readiness endpoints")
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::health::ready,
        crate::handlers::hashes::create_hashes_handler,
        crate::handlers::hashes::list_hash_algorithms_handler,
        crate::handlers::query::query_by_media_handler,
        crate::handlers::query::query_by_hash_handler,
        crate::handlers::files::get_file_handler,
        crate::handlers::watermarks::embed_watermark_handler,
        crate::handlers::watermarks::extract_watermark_handler,
        crate::handlers::watermarks::trace_origin_handler,
        crate::handlers::watermarks::list_watermark_algorithms_handler,
    ),
    components(
        schemas(
            HealthResponse,
            ReadyResponse,
            AlgorithmEntry,
            AlgorithmListResponse,
            HashAlgorithmConfig,
            HashConfig,
            HashResponse,
            MediaQueryConfig,
            DigestQueryRequest,
            SimilarityMatch,
            FileResponse,
            WatermarkHistoryItem,
            WatermarkConfig,
            WatermarkResponse,
            OriginResponse,
        )
    )
)]
pub struct ApiDoc;
