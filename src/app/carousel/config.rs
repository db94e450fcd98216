//! Carousel configuration.
//!
//! Defaults are baked in; the manifest may override any subset of them
//! (`#[serde(default)]`), after which `validate` decides whether the result
//! is usable.

use serde::Deserialize;

use super::error::{CarouselError, CarouselResult};

/// Source images are 1022x1277 (portrait).
pub const IMAGE_ASPECT_RATIO: f32 = 1022.0 / 1277.0;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CarouselConfig {
    /// Advance the ring every frame while nobody is dragging.
    pub auto_rotate: bool,
    /// Radians added to the target rotation per frame.
    pub auto_rotate_speed: f32,
    pub enable_drag: bool,
    /// Mouse wheel nudges the ring.
    pub enable_wheel: bool,
    /// Card width in world units.
    pub card_width: f32,
    /// Gap between neighbouring cards as a fraction of the card width.
    pub gap_factor: f32,
    /// Vertical field of view in degrees.
    pub camera_fov: f32,
    /// Short item lists are repeated until at least this many cards exist.
    pub min_cards: usize,
    /// The ring never gets tighter than this radius.
    pub min_camera_distance: f32,
    /// Width / height of the canvas container.
    pub aspect_ratio: f32,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            auto_rotate: true,
            auto_rotate_speed: 0.001,
            enable_drag: true,
            enable_wheel: false,
            card_width: 2.0,
            gap_factor: 0.04,
            camera_fov: 45.0,
            min_cards: 14,
            min_camera_distance: 4.5,
            aspect_ratio: 16.0 / 11.0,
        }
    }
}

impl CarouselConfig {
    pub fn card_height(&self) -> f32 {
        self.card_width / IMAGE_ASPECT_RATIO
    }

    pub fn label_height(&self) -> f32 {
        self.card_width * 0.15
    }

    /// How far the middle of a card bows away from the viewer.
    pub fn card_curvature(&self) -> f32 {
        self.card_width * 0.075
    }

    pub fn label_curvature(&self) -> f32 {
        self.card_width * 0.05
    }

    pub fn validate(self) -> CarouselResult<Self> {
        let positive = [
            ("card_width", self.card_width),
            ("camera_fov", self.camera_fov),
            ("min_camera_distance", self.min_camera_distance),
            ("aspect_ratio", self.aspect_ratio),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(CarouselError::invalid_config(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        if !self.gap_factor.is_finite() || self.gap_factor < 0.0 {
            return Err(CarouselError::invalid_config(format!(
                "gap_factor must be >= 0, got {}",
                self.gap_factor
            )));
        }
        if !self.auto_rotate_speed.is_finite() || self.auto_rotate_speed < 0.0 {
            return Err(CarouselError::invalid_config(format!(
                "auto_rotate_speed must be >= 0, got {}",
                self.auto_rotate_speed
            )));
        }
        if self.camera_fov >= 180.0 {
            return Err(CarouselError::invalid_config(format!(
                "camera_fov must be below 180 degrees, got {}",
                self.camera_fov
            )));
        }
        Ok(self)
    }
}
