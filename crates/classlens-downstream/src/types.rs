//! Wire types for the Localization service.
//!
//! The other three services' responses deserialize directly into the
//! shared model types.

use classlens_models::BoundingBox;
use serde::Deserialize;

/// Response of `POST /localize-coords`.
#[derive(Debug, Deserialize)]
pub struct CoordsResponse {
    pub coordinates: Vec<BoundingBox>,
}

/// Response of `POST /localize-faces`; each entry is a base64-encoded
/// cropped face image.
#[derive(Debug, Deserialize)]
pub struct FacesResponse {
    pub faces: Vec<String>,
}
