//! Composition and lighting selectors.

use crate::error::StudioError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Output aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 1:1 square.
    #[default]
    #[serde(rename = "1:1")]
    Square,
    /// 4:3 standard landscape.
    #[serde(rename = "4:3")]
    Standard,
    /// 3:4 standard portrait.
    #[serde(rename = "3:4")]
    StandardPortrait,
    /// 16:9 widescreen.
    #[serde(rename = "16:9")]
    Landscape,
    /// 9:16 tall.
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    /// All options, in display order.
    pub const ALL: [Self; 5] = [
        Self::Square,
        Self::Standard,
        Self::StandardPortrait,
        Self::Landscape,
        Self::Portrait,
    ];

    /// Returns the ratio label (e.g., "16:9").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Standard => "4:3",
            Self::StandardPortrait => "3:4",
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
        }
    }
}

/// Lighting style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LightingStyle {
    /// Controlled studio lighting.
    #[default]
    Studio,
    /// Natural daylight.
    Natural,
    /// High-contrast, moody light.
    Dramatic,
    /// Diffuse, low-contrast light.
    Soft,
    /// Film-like grading and light.
    Cinematic,
    /// Bright, shadowless high-key light.
    #[serde(rename = "High-Key")]
    HighKey,
}

impl LightingStyle {
    /// All options, in display order.
    pub const ALL: [Self; 6] = [
        Self::Studio,
        Self::Natural,
        Self::Dramatic,
        Self::Soft,
        Self::Cinematic,
        Self::HighKey,
    ];

    /// Returns the display label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Studio => "Studio",
            Self::Natural => "Natural",
            Self::Dramatic => "Dramatic",
            Self::Soft => "Soft",
            Self::Cinematic => "Cinematic",
            Self::HighKey => "High-Key",
        }
    }
}

/// Camera perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CameraPerspective {
    /// Camera level with the subject.
    #[default]
    #[serde(rename = "Eye-level")]
    EyeLevel,
    /// Looking down on the subject.
    #[serde(rename = "High-angle")]
    HighAngle,
    /// Looking up at the subject.
    #[serde(rename = "Low-angle")]
    LowAngle,
    /// Tilted horizon.
    #[serde(rename = "Dutch-angle")]
    DutchAngle,
    /// Straight down (flat lay).
    Overhead,
    /// Tight framing.
    #[serde(rename = "Close-up")]
    CloseUp,
}

impl CameraPerspective {
    /// All options, in display order.
    pub const ALL: [Self; 6] = [
        Self::EyeLevel,
        Self::HighAngle,
        Self::LowAngle,
        Self::DutchAngle,
        Self::Overhead,
        Self::CloseUp,
    ];

    /// Returns the display label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EyeLevel => "Eye-level",
            Self::HighAngle => "High-angle",
            Self::LowAngle => "Low-angle",
            Self::DutchAngle => "Dutch-angle",
            Self::Overhead => "Overhead",
            Self::CloseUp => "Close-up",
        }
    }
}

macro_rules! label_impls {
    ($ty:ident, $axis:literal) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = StudioError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                Self::ALL
                    .into_iter()
                    .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| {
                        let options: Vec<&str> = Self::ALL.iter().map(|v| v.as_str()).collect();
                        StudioError::Validation(format!(
                            "unknown {} '{}' (expected one of: {})",
                            $axis,
                            wanted,
                            options.join(", ")
                        ))
                    })
            }
        }
    };
}

label_impls!(AspectRatio, "aspect ratio");
label_impls!(LightingStyle, "lighting style");
label_impls!(CameraPerspective, "camera perspective");

/// One value per axis; there is no partial state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleParameters {
    /// Output aspect ratio.
    pub aspect_ratio: AspectRatio,
    /// Lighting style.
    pub lighting: LightingStyle,
    /// Camera perspective.
    pub perspective: CameraPerspective,
}

impl StyleParameters {
    /// Creates parameters from all three axes.
    pub fn new(
        aspect_ratio: AspectRatio,
        lighting: LightingStyle,
        perspective: CameraPerspective,
    ) -> Self {
        Self {
            aspect_ratio,
            lighting,
            perspective,
        }
    }

    /// Returns a copy with a different aspect ratio.
    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    /// Returns a copy with a different lighting style.
    pub fn with_lighting(mut self, lighting: LightingStyle) -> Self {
        self.lighting = lighting;
        self
    }

    /// Returns a copy with a different camera perspective.
    pub fn with_perspective(mut self, perspective: CameraPerspective) -> Self {
        self.perspective = perspective;
        self
    }
}
