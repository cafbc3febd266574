//! Aggregate frame-processing handler.

use axum::extract::{Multipart, State};
use axum::Json;

use classlens_models::FrameResponse;

use crate::error::{ApiError, ApiResult};
use crate::pipeline;
use crate::state::AppState;

/// `POST /api/process-frame`
///
/// Multipart form body: `image` (binary), `lectureId` (string),
/// `timestamp` (ISO-8601 string). Returns the aggregate analysis for
/// every face detected in the frame.
pub async fn process_frame(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<FrameResponse>> {
    let mut image: Option<Vec<u8>> = None;
    let mut lecture_id: Option<String> = None;
    let mut timestamp: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("image") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation(format!("Unreadable image field: {e}")))?;
                image = Some(bytes.to_vec());
            }
            Some("lectureId") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::validation(format!("Unreadable lectureId field: {e}")))?;
                lecture_id = Some(text);
            }
            Some("timestamp") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::validation(format!("Unreadable timestamp field: {e}")))?;
                timestamp = Some(text);
            }
            // Unknown fields are ignored
            _ => {}
        }
    }

    let image = image.unwrap_or_default();
    let lecture_id = lecture_id.unwrap_or_default();
    let timestamp = timestamp.unwrap_or_default();

    let response = pipeline::process_frame(&state, &image, &lecture_id, &timestamp).await?;
    Ok(Json(response))
}
