//! Swing analysis result returned by the pose-inference service.
//!
//! Field names follow the frontend `SwingData` contract, hence the
//! camelCase renames and the two irregular keys (`poseData3D`,
//! `impact_frame`).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::JobKind;

/// Joints per frame in the 2D COCO skeleton.
pub const COCO_JOINTS: u64 = 17;

/// Joints per frame in the 3D YOC44 skeleton.
pub const YOC44_JOINTS: u64 = 44;

/// 2D keypoint in COCO format (normalized 0-1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct Keypoint2D {
    #[validate(range(min = 0.0, max = 1.0))]
    pub x: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub y: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// 3D keypoint in YOC44 format (normalized -1 to 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct Keypoint3D {
    #[validate(range(min = -1.0, max = 1.0))]
    pub x: f64,
    #[validate(range(min = -1.0, max = 1.0))]
    pub y: f64,
    #[validate(range(min = -1.0, max = 1.0))]
    pub z: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// One frame of 2D pose data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct PoseFrame2D {
    /// Seconds from video start
    pub timestamp: f64,
    #[validate(length(equal = 17), nested)]
    pub keypoints: Vec<Keypoint2D>,
}

/// One frame of 3D pose data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct PoseFrame3D {
    /// Seconds from video start
    pub timestamp: f64,
    #[validate(length(equal = 44), nested)]
    pub keypoints: Vec<Keypoint3D>,
}

/// Kinetic chain segment a rhythm event maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum RhythmType {
    /// Legs
    Kick,
    /// Hips
    Bass,
    /// Shoulders
    Snare,
    /// Arms
    Crash,
}

/// Rhythm event mapped to the kinetic chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct RhythmNode {
    pub id: String,
    #[validate(range(min = 0.0))]
    pub timestamp: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub intensity: f64,
    #[serde(rename = "type")]
    pub rhythm_type: RhythmType,
    pub label: String,
}

/// Motion smoothness sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct KineticDataPoint {
    #[validate(range(min = 0.0))]
    pub time: f64,
    pub velocity: f64,
    /// Lower is smoother
    pub jerk: f64,
}

/// Complete swing analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_impact_frame"))]
pub struct SwingAnalysis {
    /// Swing ID
    pub id: String,
    pub user_type: JobKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    /// Seconds
    #[validate(range(exclusive_min = 0.0))]
    pub duration: f64,
    #[validate(nested)]
    pub pose_data: Vec<PoseFrame2D>,
    #[serde(rename = "poseData3D")]
    #[validate(nested)]
    pub pose_data_3d: Vec<PoseFrame3D>,
    #[validate(range(min = 1))]
    pub frames: u32,
    #[validate(range(exclusive_min = 0.0))]
    pub fps: f64,
    #[serde(rename = "impact_frame")]
    pub impact_frame: u32,
    /// Overall harmony score
    #[validate(range(max = 100))]
    pub score: u8,
    /// Coach feedback
    pub feedback: String,
    #[validate(nested)]
    pub rhythm_track: Vec<RhythmNode>,
    #[validate(nested)]
    pub velocity_data: Vec<KineticDataPoint>,
}

fn validate_impact_frame(analysis: &SwingAnalysis) -> Result<(), ValidationError> {
    if analysis.impact_frame >= analysis.frames {
        return Err(ValidationError::new("impact_frame_out_of_range"));
    }
    Ok(())
}
