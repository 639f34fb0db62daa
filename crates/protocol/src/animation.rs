//! Structured animation description sent by the plugin.
//!
//! A keyframe tree: the sequence owns ordered keyframes, each keyframe
//! owns ordered poses, and poses nest recursively to mirror the rig
//! hierarchy. Sibling order is meaningful everywhere — it encodes
//! skeletal attachment structure and must survive encoding unchanged.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_POSE_WEIGHT, DEFAULT_PRIORITY};

/// A full animation description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationPayload {
    #[serde(rename = "loop", default)]
    pub looped: bool,
    #[serde(default = "default_priority")]
    pub priority: i32,
    pub keyframes: Vec<Keyframe>,
}

/// A named, time-stamped snapshot of pose data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keyframe {
    pub name: String,
    /// Offset from the start of the animation, in seconds.
    pub time: f32,
    #[serde(default)]
    pub poses: Vec<Pose>,
}

/// A named transform attached to one skeletal part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pose {
    pub name: String,
    #[serde(default = "default_weight")]
    pub weight: f32,
    #[serde(default)]
    pub easing_style: i32,
    #[serde(default)]
    pub easing_direction: i32,
    /// 3 translation components followed by the 9 rotation-matrix
    /// components, row-major. Arity is validated by the encoder.
    pub transform: Vec<f32>,
    #[serde(default)]
    pub sub_poses: Vec<Pose>,
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

fn default_weight() -> f32 {
    DEFAULT_POSE_WEIGHT
}
