//! Image routes
//!
//! Endpoints:
//! - POST /api/upload-image - Store an image, redirect to its page
//! - GET /:hash - Render the stored image

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};

use crate::addressor::{identify, ContentIdentifier};
use crate::error::{AppError, Result, APOLOGY};
use crate::gateway::Locator;
use crate::state::AppState;

/// Multipart field carrying the image
pub const IMAGE_FIELD: &str = "image";

/// Upload route
pub fn upload_router() -> Router<AppState> {
    Router::new().route("/api/upload-image", post(upload_image))
}

/// Image page route
pub fn show_router() -> Router<AppState> {
    Router::new()
        .route("/:hash", get(show_image))
        .fallback(not_found)
}

/// Anything that is neither a static file nor an image page
async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, APOLOGY)
}

/// An image as received from the client
struct Upload {
    data: Bytes,
    mime_type: String,
}

/// POST /api/upload-image
async fn upload_image(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Response> {
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!(%rejection, "Upload is not a multipart form");
        AppError::InputMissing
    })?;

    let upload = read_image_field(&mut multipart).await?;

    let id = identify(&upload.data);
    let submission = state
        .gateway()
        .submit(&id, upload.data, &upload.mime_type)
        .await?;

    tracing::info!(
        content_id = %submission.id,
        created = submission.created,
        "Image upload accepted"
    );

    Ok((StatusCode::FOUND, [(header::LOCATION, submission.id.path())]).into_response())
}

/// Pull the image field out of the form, skipping anything else
async fn read_image_field(multipart: &mut Multipart) -> Result<Upload> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field.bytes().await?;

        // Browsers send an empty part when no file was picked
        if data.is_empty() {
            return Err(AppError::InputMissing);
        }

        return Ok(Upload { data, mime_type });
    }

    Err(AppError::InputMissing)
}

/// GET /:hash
async fn show_image(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Html<String>> {
    let id = ContentIdentifier::parse(&hash).map_err(|source| AppError::InvalidIdentifier {
        value: hash.clone(),
        source,
    })?;

    let locator = state.gateway().resolve(&id).await?;

    Ok(Html(render_image_page(&locator)))
}

fn render_image_page(locator: &Locator) -> String {
    format!(
        "<html><body><img src=\"{}\"></body></html>",
        html_escape::encode_double_quoted_attribute(&locator.media_link)
    )
}
