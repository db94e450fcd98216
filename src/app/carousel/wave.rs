//! Drag-velocity ripple on one flank of the ring (world x = -radius).
//!
//! The amplitude eases toward `|velocity| * AMPLITUDE_SCALE`; once it drops
//! below `SKIP_THRESHOLD` no vertex is touched at all.

use super::layout::{card_world_xy, CardPlacement};
use super::motion::lerp;

pub const AMPLITUDE_SCALE: f32 = 0.1;
pub const AMPLITUDE_EASING: f32 = 0.2;
pub const SKIP_THRESHOLD: f32 = 0.0005;
pub const TIME_STEP: f32 = 0.004;
/// Half-width of the falloff window in world units.
pub const WINDOW_HALF_WIDTH: f32 = 5.0;

const FREQUENCY_1: f32 = 2.0;
const FREQUENCY_2: f32 = 1.3;
const FREQUENCY_3: f32 = 0.8;
const TIME_MULTIPLIER_1: f32 = 1.0;
const TIME_MULTIPLIER_2: f32 = 1.2;
const WAVE_GAIN: f32 = 4.0;

/// Parameters for one frame of distortion; `None` from `WaveField::advance`
/// means the frame skips the effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveFrame {
    pub amplitude: f32,
    pub time: f32,
    /// World X of the distortion centre (`-radius`).
    pub center_x: f32,
}

#[derive(Debug, Clone, Default)]
pub struct WaveField {
    amplitude: f32,
    time: f32,
}

impl WaveField {
    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    pub fn advance(&mut self, velocity: f32, radius: f32) -> Option<WaveFrame> {
        let target = velocity.abs() * AMPLITUDE_SCALE;
        self.amplitude = lerp(self.amplitude, target, AMPLITUDE_EASING);
        if self.amplitude < SKIP_THRESHOLD {
            return None;
        }
        self.time += TIME_STEP;
        Some(WaveFrame {
            amplitude: self.amplitude,
            time: self.time,
            center_x: -radius,
        })
    }
}

impl WaveFrame {
    /// Cards whose centre is more than two window widths from the centre
    /// are left alone.
    pub fn touches(&self, card_world_x: f32) -> bool {
        (card_world_x - self.center_x).abs() <= WINDOW_HALF_WIDTH * 2.0
    }

    /// Quadratic falloff, 1 at the centre, 0 at and beyond the window edge.
    pub fn falloff(&self, world_x: f32) -> f32 {
        let d = (world_x - self.center_x) / WINDOW_HALF_WIDTH;
        (1.0 - d * d).max(0.0)
    }

    /// Vertical offset for a vertex at world `(x, y)`.
    pub fn displacement(&self, world_x: f32, world_y: f32) -> f32 {
        let falloff = self.falloff(world_x);
        if falloff == 0.0 {
            return 0.0;
        }
        let wave = self.amplitude
            * WAVE_GAIN
            * ((world_x * FREQUENCY_1 + self.time * TIME_MULTIPLIER_1).sin()
                + (world_x * FREQUENCY_2 + world_y * FREQUENCY_3 + self.time * TIME_MULTIPLIER_2).sin())
            * 0.5;
        wave * falloff
    }

    /// Write displaced positions of one card mesh into `out`, starting from
    /// the cached undistorted `original` positions. Returns false (and
    /// leaves `out` untouched) when the card is outside the window.
    ///
    /// `offset` is the mesh's position inside the card (labels sit below
    /// the image).
    pub fn distort(
        &self,
        original: &[[f32; 3]],
        out: &mut Vec<[f32; 3]>,
        offset: [f32; 3],
        placement: &CardPlacement,
        ring_rotation: f32,
    ) -> bool {
        let (centre_x, _) = card_world_xy(0.0, 0.0, placement, ring_rotation);
        if !self.touches(centre_x) {
            return false;
        }
        out.clear();
        out.extend(original.iter().map(|&[x, y, z]| {
            let (wx, wy) = card_world_xy(x + offset[0], y + offset[1], placement, ring_rotation);
            [x, y + self.displacement(wx, wy), z]
        }));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::carousel::config::CarouselConfig;
    use crate::app::carousel::layout::RingLayout;

    fn frame(amplitude: f32) -> WaveFrame {
        WaveFrame {
            amplitude,
            time: 0.3,
            center_x: -5.0,
        }
    }

    #[test]
    fn zero_velocity_never_activates() {
        let mut wave = WaveField::default();
        for _ in 0..10 {
            assert!(wave.advance(0.0, 5.0).is_none());
        }
    }

    #[test]
    fn amplitude_eases_toward_target() {
        let mut wave = WaveField::default();
        let first = wave.advance(1.0, 5.0).unwrap();
        assert!((first.amplitude - 0.02).abs() < 1e-6);
        assert!((first.time - TIME_STEP).abs() < 1e-7);
        assert_eq!(first.center_x, -5.0);
        let second = wave.advance(1.0, 5.0).unwrap();
        assert!((second.amplitude - 0.036).abs() < 1e-6);
    }

    #[test]
    fn amplitude_dies_out_after_release() {
        let mut wave = WaveField::default();
        for _ in 0..20 {
            wave.advance(2.0, 5.0);
        }
        // Velocity decays by 0.95 per frame once released.
        let mut velocity = 2.0_f32;
        let mut quiet_from = None;
        for frame in 0..400 {
            velocity *= 0.95;
            let active = wave.advance(velocity, 5.0).is_some();
            match (active, quiet_from) {
                (false, None) => quiet_from = Some(frame),
                (true, Some(q)) => panic!("wave came back at {} after going quiet at {}", frame, q),
                _ => {}
            }
        }
        assert!(quiet_from.unwrap() < 200);
    }

    #[test]
    fn displacement_is_zero_outside_window() {
        let f = frame(0.5);
        for x in [-10.01, -10.0, 0.0, 0.01, 3.0, 12.0] {
            assert_eq!(f.displacement(x, 0.4), 0.0, "x = {}", x);
        }
        assert!(f.displacement(-5.2, 0.4) != 0.0);
    }

    #[test]
    fn falloff_peaks_at_centre() {
        let f = frame(0.5);
        assert_eq!(f.falloff(-5.0), 1.0);
        assert!((f.falloff(-7.5) - 0.75).abs() < 1e-6);
        assert_eq!(f.falloff(0.0), 0.0);
    }

    #[test]
    fn distort_only_touches_y_and_starts_from_originals() {
        let ring = RingLayout::new(16, &CarouselConfig::default());
        // Card 12 of 16 sits at angle 3π/2, i.e. world x = -radius at rest.
        let placement = ring.placement(12).unwrap();
        let f = WaveFrame {
            amplitude: 0.2,
            time: 0.1,
            center_x: -ring.radius(),
        };
        let original = vec![[0.5, 0.25, -0.1], [-0.5, -0.25, -0.1]];
        let mut out = Vec::new();
        assert!(f.distort(&original, &mut out, [0.0, 0.0, 0.0], &placement, 0.0));
        assert_eq!(out.len(), 2);
        for (a, b) in original.iter().zip(&out) {
            assert_eq!(a[0], b[0]);
            assert_eq!(a[2], b[2]);
        }
        let again = {
            let mut second = Vec::new();
            f.distort(&original, &mut second, [0.0, 0.0, 0.0], &placement, 0.0);
            second
        };
        assert_eq!(out, again);
    }

    #[test]
    fn distort_skips_cards_far_from_centre() {
        let ring = RingLayout::new(16, &CarouselConfig::default());
        let placement = ring.placement(4).unwrap();
        let f = WaveFrame {
            amplitude: 0.2,
            time: 0.1,
            center_x: -ring.radius(),
        };
        let mut out = vec![[9.0, 9.0, 9.0]];
        assert!(!f.distort(&[[0.0, 0.0, 0.0]], &mut out, [0.0, 0.0, 0.0], &placement, 0.0));
        assert_eq!(out, vec![[9.0, 9.0, 9.0]]);
    }
}
