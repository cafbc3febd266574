//! Per-face analysis result types.
//!
//! Wire shapes match the downstream service contracts: the Recognition,
//! Attention, and HandRaising responses deserialize straight into these
//! types, and `FaceAnalysis` is the per-face record of the aggregate
//! frame response.

use serde::{Deserialize, Serialize};

use crate::bounding_box::BoundingBox;

/// Whether the recognized identity is newly seen or previously known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecognitionStatus {
    New,
    Found,
}

/// Result of the Recognition service's `/identify` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub person_id: String,
    pub status: RecognitionStatus,
}

/// Attention classification for one face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttentionStatus {
    Focused,
    Unfocused,
}

/// Result of the Attention service's `/detect-face-attention` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttentionResult {
    pub attention_status: AttentionStatus,
    pub confidence: f64,
}

/// Location of a detected raised hand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HandPosition {
    pub x: f64,
    pub y: f64,
    /// Depth coordinate, reported only by depth-capable cameras
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

/// Result of the HandRaising service's `/detect-hand-raising` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandRaisingResult {
    pub is_hand_raised: bool,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hand_position: Option<HandPosition>,
}

/// Final per-face record: the joined output of all three analysis
/// services plus the passed-through bounding box. Immutable once
/// assembled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceAnalysis {
    pub person_id: String,
    pub recognition_status: RecognitionStatus,
    pub attention_status: AttentionStatus,
    pub hand_raising_status: HandRaisingResult,
    /// Mirrors the attention confidence
    pub confidence: f64,
    pub bounding_box: BoundingBox,
}

impl FaceAnalysis {
    /// Join the three per-face results with the face's bounding box.
    pub fn assemble(
        recognition: RecognitionResult,
        attention: AttentionResult,
        hand_raising: HandRaisingResult,
        bounding_box: BoundingBox,
    ) -> Self {
        Self {
            person_id: recognition.person_id,
            recognition_status: recognition.status,
            attention_status: attention.attention_status,
            hand_raising_status: hand_raising,
            confidence: attention.confidence,
            bounding_box,
        }
    }
}
