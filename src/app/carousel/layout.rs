//! Ring layout: where each card sits on the cylinder and which way it faces.
//!
//! Nothing here is stored per card; every placement is recomputed from the
//! index, the card count and the radius.

use std::f32::consts::{PI, TAU};

use super::config::CarouselConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardPlacement {
    /// Angle of the card around the ring axis, radians.
    pub angle: f32,
    /// Card centre in ring space (before ring rotation).
    pub position: [f32; 3],
    /// Rotation of the card about the vertical axis. `angle + π` turns the
    /// card's +Z face toward the ring axis.
    pub facing: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingLayout {
    count: usize,
    radius: f32,
}

/// `max(card_width * (1 + gap) * count / 2π, min_distance)`.
pub fn ring_radius(count: usize, card_width: f32, gap_factor: f32, min_distance: f32) -> f32 {
    let circumference = card_width * (1.0 + gap_factor) * count as f32;
    (circumference / TAU).max(min_distance)
}

impl RingLayout {
    pub fn new(count: usize, config: &CarouselConfig) -> Self {
        Self {
            count,
            radius: ring_radius(
                count,
                config.card_width,
                config.gap_factor,
                config.min_camera_distance,
            ),
        }
    }

    #[cfg(test)]
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Angular spacing between neighbours; zero for an empty ring.
    pub fn angle_per_item(&self) -> f32 {
        if self.count == 0 {
            0.0
        } else {
            TAU / self.count as f32
        }
    }

    pub fn placement(&self, index: usize) -> Option<CardPlacement> {
        if index >= self.count {
            return None;
        }
        let angle = index as f32 / self.count as f32 * TAU;
        Some(CardPlacement {
            angle,
            position: [self.radius * angle.sin(), 0.0, self.radius * angle.cos()],
            facing: angle + PI,
        })
    }

    pub fn placements(&self) -> impl Iterator<Item = CardPlacement> + '_ {
        (0..self.count).filter_map(|i| self.placement(i))
    }

    /// Card whose image is hit by a ray cast from the ring axis along `dir`
    /// (world space) while the ring is turned by `ring_rotation`. Cards are
    /// treated as flat patches of the cylinder; gaps and label strips miss.
    pub fn card_under_ray(
        &self,
        dir: [f32; 3],
        ring_rotation: f32,
        card_width: f32,
        card_height: f32,
    ) -> Option<usize> {
        if self.count == 0 {
            return None;
        }
        let horizontal = dir[0].hypot(dir[2]);
        if horizontal <= f32::EPSILON {
            return None;
        }
        let distance = self.radius / horizontal;
        if (dir[1] * distance).abs() > card_height / 2.0 {
            return None;
        }
        let world_angle = dir[0].atan2(dir[2]);
        let ring_angle = (world_angle - ring_rotation).rem_euclid(TAU);
        let per_item = self.angle_per_item();
        let slot = (ring_angle / per_item).round();
        if (ring_angle - slot * per_item).abs() * self.radius > card_width / 2.0 {
            return None;
        }
        Some(slot as usize % self.count)
    }
}

/// World-space direction through a viewport point given in normalized
/// device coordinates, for the camera at the origin looking along +Z with
/// +Y up. Screen right is world -X.
pub fn view_ray(ndc: [f32; 2], aspect: f32, fov_degrees: f32) -> [f32; 3] {
    let half_height = (fov_degrees.to_radians() / 2.0).tan();
    [-ndc[0] * half_height * aspect, ndc[1] * half_height, 1.0]
}

/// World X/Y of a card-local vertex `(x, y, 0)` once the card is turned to
/// its facing, moved onto the ring and the ring is rotated by
/// `ring_rotation` about the vertical axis. Y never changes.
pub fn card_world_xy(local_x: f32, local_y: f32, placement: &CardPlacement, ring_rotation: f32) -> (f32, f32) {
    let (sin_f, cos_f) = placement.facing.sin_cos();
    let ring_x = placement.position[0] + local_x * cos_f;
    let ring_z = placement.position[2] - local_x * sin_f;
    let (sin_r, cos_r) = ring_rotation.sin_cos();
    (ring_x * cos_r + ring_z * sin_r, local_y)
}
