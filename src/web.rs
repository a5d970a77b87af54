use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::content::{ContentCategory, ImageAssetRecord, extension_from_mime_type, inline, records};
use crate::error::MediaError;
use crate::ingest::{IngestService, generate_asset_id};
use crate::present;

#[derive(Serialize)]
struct ApiResponse<T: Serialize> {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

#[derive(Serialize)]
struct UploadData {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    full_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    base64_image: Option<String>,
    original_filename: String,
}

#[derive(Serialize)]
struct ListedImage {
    id: String,
    category: ContentCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    caption: Option<String>,
    display_order: i32,
    created_at: String,
}

fn json_message(status: StatusCode, message: &str) -> Response {
    let body: ApiResponse<()> = ApiResponse {
        success: status.is_success(),
        message: message.to_string(),
        data: None,
    };
    (status, Json(body)).into_response()
}

fn error_response(err: &MediaError) -> Response {
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    json_message(status, &err.to_string())
}

pub async fn handle_photo_upload(
    State(service): State<Arc<IngestService>>,
    mut multipart: Multipart,
) -> Response {
    let mut file_name = None;
    let mut content_type = None;
    let mut bytes = None;
    let mut category = ContentCategory::Cat;
    let mut name_prefix = None;
    let mut caption = None;
    let mut display_order = 0;

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => match field.name().map(str::to_string).as_deref() {
                Some("file") => {
                    content_type = field.content_type().map(|value| value.to_string());
                    file_name = Some(field.file_name().unwrap_or("").to_string());
                    match field.bytes().await {
                        Ok(data) => bytes = Some(data),
                        Err(err) => {
                            return json_message(
                                StatusCode::BAD_REQUEST,
                                &format!("failed to read uploaded file: {err}"),
                            );
                        }
                    }
                }
                Some("category") => match field.text().await {
                    Ok(value) => match ContentCategory::parse(&value) {
                        Some(parsed) => category = parsed,
                        None => {
                            return json_message(
                                StatusCode::BAD_REQUEST,
                                &format!("unknown category: {value}"),
                            );
                        }
                    },
                    Err(err) => {
                        return json_message(
                            StatusCode::BAD_REQUEST,
                            &format!("failed to read form field: {err}"),
                        );
                    }
                },
                Some("name") => {
                    name_prefix = field.text().await.ok().filter(|v| !v.trim().is_empty());
                }
                Some("caption") => {
                    caption = field.text().await.ok().filter(|v| !v.trim().is_empty());
                }
                Some("display_order") => {
                    display_order = field
                        .text()
                        .await
                        .ok()
                        .and_then(|v| v.trim().parse().ok())
                        .unwrap_or(0);
                }
                _ => {}
            },
            Ok(None) => break,
            Err(err) => {
                return json_message(
                    StatusCode::BAD_REQUEST,
                    &format!("failed to read form: {err}"),
                );
            }
        }
    }

    let Some(bytes) = bytes else {
        return json_message(StatusCode::BAD_REQUEST, "no file uploaded");
    };
    if bytes.is_empty() {
        return json_message(StatusCode::BAD_REQUEST, "uploaded file is empty");
    }
    let file_name = resolve_file_name(file_name.as_deref(), content_type.as_deref());

    let ingested = match service
        .ingest(bytes.as_ref(), &file_name, category, name_prefix.as_deref())
        .await
    {
        Ok(ingested) => ingested,
        Err(err) => return error_response(&err),
    };

    let record = ImageAssetRecord {
        id: ingested.id.clone(),
        source_filename: file_name.clone(),
        category,
        stored_path: ingested.stored_path().map(str::to_string),
        thumbnail_path: ingested.thumbnail_path().map(str::to_string),
        inline_encoded: ingested.inline_encoded().map(str::to_string),
        caption,
        display_order,
        created_at: Utc::now().to_rfc3339(),
    };
    if let Err(err) = records::save_record(service.store(), &record).await {
        return error_response(&MediaError::StorageWriteFailed(err));
    }

    info!(id = %record.id, category = ?category, "photo uploaded");

    let prefix = service.store().public_prefix();
    let data = UploadData {
        id: record.id,
        full_image: ingested
            .stored_path()
            .map(|path| present::display_path(path, prefix)),
        thumbnail: ingested
            .thumbnail_path()
            .map(|path| present::display_path(path, prefix)),
        base64_image: ingested.inline_encoded().map(str::to_string),
        original_filename: file_name,
    };
    (
        StatusCode::OK,
        Json(ApiResponse {
            success: true,
            message: "photo uploaded successfully".to_string(),
            data: Some(data),
        }),
    )
        .into_response()
}

#[derive(Deserialize)]
pub struct InlineUploadRequest {
    pub image_base64: String,
    pub category: Option<String>,
    pub caption: Option<String>,
    #[serde(default)]
    pub display_order: i32,
}

/// Accept a pre-encoded inline image (the gallery path). The payload is
/// marker-normalized and must decode as base64, but is stored as given
/// rather than re-transcoded.
pub async fn handle_inline_upload(
    State(service): State<Arc<IngestService>>,
    Json(request): Json<InlineUploadRequest>,
) -> Response {
    let category = match &request.category {
        Some(value) => match ContentCategory::parse(value) {
            Some(parsed) => parsed,
            None => {
                return json_message(
                    StatusCode::BAD_REQUEST,
                    &format!("unknown category: {value}"),
                );
            }
        },
        None => ContentCategory::Article,
    };

    let payload = match inline::decode_payload(&request.image_base64) {
        Ok(payload) if !payload.is_empty() => payload,
        Ok(_) => return json_message(StatusCode::BAD_REQUEST, "inline image is empty"),
        Err(err) => {
            return json_message(
                StatusCode::BAD_REQUEST,
                &format!("inline image is not valid base64: {err}"),
            );
        }
    };

    let normalized = inline::ensure_marker(request.image_base64.trim());
    let record = ImageAssetRecord {
        id: generate_asset_id(category, None, "inline", payload.len()),
        source_filename: String::new(),
        category,
        stored_path: None,
        thumbnail_path: None,
        inline_encoded: Some(normalized.clone()),
        caption: request.caption.filter(|v| !v.trim().is_empty()),
        display_order: request.display_order,
        created_at: Utc::now().to_rfc3339(),
    };
    if let Err(err) = records::save_record(service.store(), &record).await {
        return error_response(&MediaError::StorageWriteFailed(err));
    }

    info!(id = %record.id, category = ?category, "inline image stored");

    let data = UploadData {
        id: record.id,
        full_image: None,
        thumbnail: None,
        base64_image: Some(normalized),
        original_filename: String::new(),
    };
    (
        StatusCode::OK,
        Json(ApiResponse {
            success: true,
            message: "image stored successfully".to_string(),
            data: Some(data),
        }),
    )
        .into_response()
}

#[derive(Deserialize)]
pub struct ListImagesQuery {
    pub category: Option<String>,
    pub limit: Option<usize>,
}

pub async fn handle_list_images(
    State(service): State<Arc<IngestService>>,
    Query(query): Query<ListImagesQuery>,
) -> Response {
    let category = match query.category.as_deref() {
        Some(value) => match ContentCategory::parse(value) {
            Some(parsed) => Some(parsed),
            None => {
                return json_message(
                    StatusCode::BAD_REQUEST,
                    &format!("unknown category: {value}"),
                );
            }
        },
        None => None,
    };
    let limit = query.limit.unwrap_or(100);

    let listed = match records::list_records(service.store(), category, limit).await {
        Ok(listed) => listed,
        Err(err) => return error_response(&MediaError::StorageWriteFailed(err)),
    };

    let prefix = service.store().public_prefix();
    let images: Vec<ListedImage> = listed
        .into_iter()
        .map(|record| ListedImage {
            image: present::display_image(
                record.inline_encoded.as_deref(),
                record.stored_path.as_deref(),
                prefix,
            ),
            thumbnail: record
                .thumbnail_path
                .as_deref()
                .map(|path| present::display_path(path, prefix)),
            id: record.id,
            category: record.category,
            caption: record.caption,
            display_order: record.display_order,
            created_at: record.created_at,
        })
        .collect();

    (
        StatusCode::OK,
        Json(ApiResponse {
            success: true,
            message: format!("{} images", images.len()),
            data: Some(images),
        }),
    )
        .into_response()
}

pub async fn handle_delete_image(
    State(service): State<Arc<IngestService>>,
    Path(id): Path<String>,
) -> Response {
    match records::delete_record(service.store(), &id).await {
        Ok(true) => {
            info!(id = %id, "image deleted");
            json_message(StatusCode::OK, "image deleted")
        }
        Ok(false) => json_message(StatusCode::NOT_FOUND, "image not found"),
        Err(err) => error_response(&MediaError::StorageWriteFailed(err)),
    }
}

pub async fn handle_cleanup(State(service): State<Arc<IngestService>>) -> Response {
    match service.sweep_temp().await {
        Ok(removed) => {
            if removed > 0 {
                info!(removed, "temp sweep");
            }
            json_message(
                StatusCode::OK,
                &format!("removed {removed} temporary files"),
            )
        }
        Err(err) => {
            warn!(error = %err, "temp sweep failed");
            error_response(&err)
        }
    }
}

fn resolve_file_name(file_name: Option<&str>, content_type: Option<&str>) -> String {
    if let Some(name) = file_name.filter(|name| !name.trim().is_empty()) {
        return name.to_string();
    }
    let ext = content_type
        .and_then(extension_from_mime_type)
        .unwrap_or("bin");
    format!("upload.{ext}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_falls_back_to_content_type() {
        assert_eq!(resolve_file_name(Some("misty.png"), None), "misty.png");
        assert_eq!(
            resolve_file_name(None, Some("image/jpeg")),
            "upload.jpg"
        );
        assert_eq!(resolve_file_name(Some("  "), None), "upload.bin");
        assert_eq!(resolve_file_name(None, Some("text/html")), "upload.bin");
    }
}
