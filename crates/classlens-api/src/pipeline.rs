//! Frame-processing orchestration.
//!
//! One inbound frame fans out to the Localization service (twice,
//! concurrently: coordinates + crops), then per detected face to
//! Recognition and, with the recognized id, to Attention and
//! HandRaising. The join is all-or-nothing: the first downstream
//! failure aborts the whole frame, and no partial response is ever
//! produced.

use futures_util::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info};

use classlens_downstream::{DownstreamClient, DownstreamError};
use classlens_models::{timestamp, BoundingBox, FaceAnalysis, FrameResponse};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// One detected face awaiting analysis: the cropped image and the
/// bounding box that shares its positional index. Consumed exactly
/// once by `analyze_face`.
struct FaceRecord {
    face_image: Vec<u8>,
    bounding_box: BoundingBox,
}

/// Process one frame end to end.
///
/// Preconditions are checked in order, each with its own 400 message,
/// before any downstream call is issued. The final `faces` sequence
/// preserves Localization's output order, and the caller-supplied
/// timestamp is echoed back verbatim.
pub async fn process_frame(
    state: &AppState,
    image: &[u8],
    lecture_id: &str,
    timestamp_str: &str,
) -> ApiResult<FrameResponse> {
    if image.is_empty() {
        return Err(ApiError::validation("Image is required"));
    }
    if lecture_id.is_empty() {
        return Err(ApiError::validation("Lecture ID is required"));
    }
    if timestamp_str.is_empty() {
        return Err(ApiError::validation("Timestamp is required"));
    }
    timestamp::validate_canonical(timestamp_str)
        .map_err(|_| ApiError::validation("Invalid timestamp format. Must be ISO 8601"))?;

    let downstream = state.downstream.as_ref();

    // Both localization views are needed before any face can be
    // analyzed; neither result is usable alone.
    let (coordinates, faces) = tokio::try_join!(
        downstream.localize_coords(image),
        downstream.localize_faces(image),
    )
    .map_err(ApiError::from)?;

    if coordinates.len() != faces.len() {
        return Err(ApiError::pipeline(
            format!(
                "Mismatch between detected faces and coordinates ({} faces, {} coordinates)",
                faces.len(),
                coordinates.len()
            ),
            "No additional details available",
        ));
    }

    debug!(faces = faces.len(), lecture_id, "localization complete");

    let records = faces
        .into_iter()
        .zip(coordinates)
        .map(|(face_image, bounding_box)| FaceRecord {
            face_image,
            bounding_box,
        });

    // Ordered, bounded fan-out: `buffered` keeps Localization's output
    // order and caps in-flight faces, and `try_collect` stops waiting
    // on siblings after the first failure.
    let analyses: Vec<FaceAnalysis> = stream::iter(records)
        .map(|record| analyze_face(downstream, record, lecture_id, timestamp_str))
        .buffered(state.config.face_concurrency)
        .try_collect()
        .await
        .map_err(ApiError::from)?;

    crate::metrics::record_frame_processed(analyses.len());
    info!(
        lecture_id,
        total_faces = analyses.len(),
        "frame processed"
    );

    Ok(FrameResponse::assemble(lecture_id, timestamp_str, analyses))
}

/// Run the per-face pipeline: identify the face, then fetch attention
/// and hand-raising for the recognized person.
///
/// Attention and hand-raising both depend only on the recognition
/// result, so they run concurrently; outputs are identical to a
/// sequential ordering.
async fn analyze_face(
    downstream: &DownstreamClient,
    record: FaceRecord,
    lecture_id: &str,
    timestamp: &str,
) -> Result<FaceAnalysis, DownstreamError> {
    let recognition = downstream.identify(&record.face_image).await?;

    let (attention, hand_raising) = tokio::try_join!(
        downstream.detect_attention(
            &record.face_image,
            &recognition.person_id,
            lecture_id,
            timestamp,
        ),
        downstream.detect_hand_raising(&record.face_image, &recognition.person_id, timestamp),
    )?;

    Ok(FaceAnalysis::assemble(
        recognition,
        attention,
        hand_raising,
        record.bounding_box,
    ))
}
