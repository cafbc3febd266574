//! Shared data models for the classlens gateway.
//!
//! This crate provides Serde-serializable types for:
//! - Face bounding boxes returned by the Localization service
//! - Per-face analysis results (recognition, attention, hand-raising)
//! - The aggregate frame response and its summary counters
//! - Strict ISO-8601 timestamp validation

pub mod bounding_box;
pub mod face;
pub mod frame;
pub mod timestamp;

// Re-export common types
pub use bounding_box::BoundingBox;
pub use face::{
    AttentionResult, AttentionStatus, FaceAnalysis, HandPosition, HandRaisingResult,
    RecognitionResult, RecognitionStatus,
};
pub use frame::{FrameResponse, Summary};
pub use timestamp::{validate_canonical, TimestampError};
