//! Aggregate frame response and summary counters.

use serde::{Deserialize, Serialize};

use crate::face::{AttentionStatus, FaceAnalysis, RecognitionStatus};

/// Counts over the joined face records of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub new_faces: usize,
    pub known_faces: usize,
    pub focused_faces: usize,
    pub unfocused_faces: usize,
    pub hands_raised: usize,
}

impl Summary {
    /// Compute the counters in a single pass over the face records.
    pub fn from_faces(faces: &[FaceAnalysis]) -> Self {
        let mut summary = Self {
            new_faces: 0,
            known_faces: 0,
            focused_faces: 0,
            unfocused_faces: 0,
            hands_raised: 0,
        };

        for face in faces {
            match face.recognition_status {
                RecognitionStatus::New => summary.new_faces += 1,
                RecognitionStatus::Found => summary.known_faces += 1,
            }
            match face.attention_status {
                AttentionStatus::Focused => summary.focused_faces += 1,
                AttentionStatus::Unfocused => summary.unfocused_faces += 1,
            }
            if face.hand_raising_status.is_hand_raised {
                summary.hands_raised += 1;
            }
        }

        summary
    }
}

/// The aggregate response for one processed frame.
///
/// `faces` preserves the Localization service's output order, and the
/// timestamp is the caller-supplied capture time echoed back verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameResponse {
    pub lecture_id: String,
    pub timestamp: String,
    pub total_faces: usize,
    pub faces: Vec<FaceAnalysis>,
    pub summary: Summary,
}

impl FrameResponse {
    /// Assemble the response from the joined face records and the
    /// request context. Pure function, no I/O.
    pub fn assemble(
        lecture_id: impl Into<String>,
        timestamp: impl Into<String>,
        faces: Vec<FaceAnalysis>,
    ) -> Self {
        let summary = Summary::from_faces(&faces);
        Self {
            lecture_id: lecture_id.into(),
            timestamp: timestamp.into(),
            total_faces: faces.len(),
            faces,
            summary,
        }
    }
}
