//! Rotation and pointer interaction for the ring.
//!
//! The target rotation is what input writes to; the rendered rotation only
//! ever chases it through a first-order low-pass filter, so a jump of the
//! target never shows up as a snap on screen.
//!
//! Both rotations accumulate without wrapping, so they are kept in `f64`:
//! in `f32` a 0.001 rad step stops registering once the total passes a few
//! thousand radians. Renderers take the wrapped `f32` angle from
//! `MotionSnapshot::render_angle`.

use std::f64::consts::TAU;

/// Radians of target rotation per pixel of horizontal drag.
pub const DRAG_SENSITIVITY: f32 = 0.002;
/// Drag velocity recorded per pixel of horizontal drag (feeds the wave).
pub const DRAG_VELOCITY_SCALE: f32 = 0.01;
/// Per-frame multiplicative decay of the drag velocity while released.
pub const VELOCITY_DECAY: f32 = 0.95;
/// Fraction of the remaining distance covered each frame.
pub const ROTATION_SMOOTHING: f64 = 0.1;
/// Auto-rotation multiplier applied after a drag is released.
pub const RELEASE_BOOST: f32 = 2.0;
/// Radians of target rotation per wheel delta unit.
pub const WHEEL_SENSITIVITY: f32 = 0.001;
/// Horizontal pointer travel, in pixels, above which a press counts as a
/// drag rather than a click.
pub const CLICK_SLOP_PX: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AutoRotating,
    Dragging,
}

/// Read-only view of the motion state for renderers and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSnapshot {
    pub phase: Phase,
    pub rotation: f64,
    pub target_rotation: f64,
    pub velocity: f32,
    pub auto_rotate_speed: f32,
}

impl MotionSnapshot {
    /// Rendered rotation wrapped to `[0, 2π)` and narrowed for the GPU.
    pub fn render_angle(&self) -> f32 {
        self.rotation.rem_euclid(TAU) as f32
    }
}

#[derive(Debug, Clone)]
pub struct RingMotion {
    phase: Phase,
    rotation: f64,
    target_rotation: f64,
    velocity: f32,
    base_speed: f32,
    current_speed: f32,
    auto_rotate: bool,
    enable_drag: bool,
    enable_wheel: bool,
    previous_x: f32,
    /// Total |dx| since the last press.
    travel: f32,
}

impl RingMotion {
    pub fn new(base_speed: f32, auto_rotate: bool, enable_drag: bool, enable_wheel: bool) -> Self {
        Self {
            phase: Phase::AutoRotating,
            rotation: 0.0,
            target_rotation: 0.0,
            velocity: 0.0,
            base_speed,
            current_speed: base_speed,
            auto_rotate,
            enable_drag,
            enable_wheel,
            previous_x: 0.0,
            travel: 0.0,
        }
    }

    pub fn target_rotation(&self) -> f64 {
        self.target_rotation
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// True when the last press moved the pointer little enough to be a
    /// click. A press with drag disabled is always a click.
    pub fn last_press_was_click(&self) -> bool {
        self.travel <= CLICK_SLOP_PX
    }

    pub fn snapshot(&self) -> MotionSnapshot {
        MotionSnapshot {
            phase: self.phase,
            rotation: self.rotation,
            target_rotation: self.target_rotation,
            velocity: self.velocity,
            auto_rotate_speed: self.current_speed,
        }
    }

    pub fn pointer_down(&mut self, client_x: f32) {
        self.travel = 0.0;
        if !self.enable_drag {
            return;
        }
        self.phase = Phase::Dragging;
        self.previous_x = client_x;
        self.current_speed = 0.0;
    }

    pub fn pointer_move(&mut self, client_x: f32) {
        if self.phase != Phase::Dragging {
            return;
        }
        let delta_x = client_x - self.previous_x;
        self.previous_x = client_x;
        self.travel += delta_x.abs();
        self.velocity = delta_x * DRAG_VELOCITY_SCALE;
        self.target_rotation -= f64::from(delta_x * DRAG_SENSITIVITY);
    }

    /// Pointer released or left the canvas. Only an active drag hands
    /// control back to auto-rotation, at the boosted rate.
    pub fn pointer_up(&mut self) {
        if self.phase != Phase::Dragging {
            return;
        }
        self.phase = Phase::AutoRotating;
        self.current_speed = self.base_speed * RELEASE_BOOST;
    }

    pub fn wheel(&mut self, delta_y: f32) {
        if self.enable_wheel {
            self.target_rotation += f64::from(delta_y) * f64::from(WHEEL_SENSITIVITY);
        }
    }

    /// Bring the next card to the front.
    pub fn step_next(&mut self, count: usize) {
        if count > 0 {
            self.target_rotation -= TAU / count as f64;
        }
    }

    /// Bring the previous card to the front.
    pub fn step_prev(&mut self, count: usize) {
        if count > 0 {
            self.target_rotation += TAU / count as f64;
        }
    }

    /// Rotate the shortest way around the ring until `index` is in front.
    pub fn jump_to(&mut self, index: usize, count: usize) {
        let Some(current) = active_index(self.target_rotation, count) else {
            return;
        };
        if index >= count || index == current {
            return;
        }
        let mut diff = index as i64 - current as i64;
        let n = count as i64;
        if diff.abs() * 2 > n {
            diff -= diff.signum() * n;
        }
        self.target_rotation -= diff as f64 * (TAU / count as f64);
    }

    /// First half of a frame: auto-rotation and velocity decay, both only
    /// while released.
    pub fn drive(&mut self) {
        if self.phase != Phase::Dragging {
            if self.auto_rotate {
                self.target_rotation += f64::from(self.current_speed);
            }
            self.velocity *= VELOCITY_DECAY;
        }
    }

    /// Second half of a frame: move the rendered rotation toward the target.
    pub fn smooth(&mut self) {
        self.rotation += (self.target_rotation - self.rotation) * ROTATION_SMOOTHING;
    }
}

pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Card index closest to the front for a ring rotation. Rotation runs
/// opposite to index order, hence `(count - slot) % count`.
pub fn active_index(rotation: f64, count: usize) -> Option<usize> {
    if count == 0 {
        return None;
    }
    let normalized = rotation.rem_euclid(TAU);
    let per_item = TAU / count as f64;
    let slot = (normalized / per_item).round() as usize % count;
    Some((count - slot) % count)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: f32 = 0.001;

    impl RingMotion {
        fn advance(&mut self) {
            self.drive();
            self.smooth();
        }
    }

    fn motion() -> RingMotion {
        RingMotion::new(BASE, true, true, true)
    }

    #[test]
    fn active_index_for_three_items() {
        let spacing = TAU / 3.0;
        assert_eq!(active_index(0.0, 3), Some(0));
        assert_eq!(active_index(spacing, 3), Some(2));
        assert_eq!(active_index(2.0 * spacing, 3), Some(1));
        assert_eq!(active_index(-spacing, 3), Some(1));
    }

    #[test]
    fn active_index_is_periodic() {
        for n in 1..20 {
            for step in 0..50 {
                let r = step as f64 * 0.37 - 9.0;
                // Stay clear of the rounding boundary between two slots.
                let frac = (r.rem_euclid(TAU) / (TAU / n as f64)).fract();
                if (frac - 0.5).abs() < 1e-2 {
                    continue;
                }
                assert_eq!(active_index(r, n), active_index(r + TAU, n), "r = {}, n = {}", r, n);
            }
        }
    }

    #[test]
    fn active_index_of_empty_ring() {
        assert_eq!(active_index(1.0, 0), None);
    }

    #[test]
    fn drag_moves_target_and_pauses_auto_rotation() {
        let mut m = motion();
        m.pointer_down(200.0);
        assert_eq!(m.snapshot().phase, Phase::Dragging);
        assert_eq!(m.snapshot().auto_rotate_speed, 0.0);
        m.pointer_move(300.0);
        assert!((m.target_rotation() + 100.0 * f64::from(DRAG_SENSITIVITY)).abs() < 1e-6);
        assert!((m.velocity() - 100.0 * DRAG_VELOCITY_SCALE).abs() < 1e-6);

        let before = m.target_rotation();
        m.advance();
        assert_eq!(m.target_rotation(), before);
        assert!((m.velocity() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn leftward_drag_raises_target() {
        let mut m = motion();
        m.pointer_down(300.0);
        m.pointer_move(250.0);
        m.pointer_move(200.0);
        assert!((m.target_rotation() - 100.0 * f64::from(DRAG_SENSITIVITY)).abs() < 1e-6);
    }

    #[test]
    fn release_boosts_auto_rotation() {
        let mut m = motion();
        m.pointer_down(0.0);
        m.pointer_move(100.0);
        m.pointer_up();
        assert_eq!(m.snapshot().phase, Phase::AutoRotating);
        assert_eq!(m.snapshot().auto_rotate_speed, 2.0 * BASE);
        let before = m.target_rotation();
        m.advance();
        assert!((m.target_rotation() - before - 2.0 * f64::from(BASE)).abs() < 1e-9);
    }

    #[test]
    fn leave_without_drag_keeps_speed() {
        let mut m = motion();
        m.pointer_up();
        assert_eq!(m.snapshot().auto_rotate_speed, BASE);
    }

    #[test]
    fn auto_rotation_keeps_stepping_after_long_uptime() {
        let mut m = motion();
        m.wheel(33_000.0 / WHEEL_SENSITIVITY);
        let before = m.target_rotation();
        for _ in 0..600 {
            m.drive();
        }
        let advanced = m.target_rotation() - before;
        assert!((advanced - 600.0 * f64::from(BASE)).abs() < 1e-6, "advanced {}", advanced);
    }

    #[test]
    fn render_angle_is_wrapped_and_precise() {
        let mut m = motion();
        m.wheel(40_000.0 / WHEEL_SENSITIVITY);
        for _ in 0..2000 {
            m.smooth();
        }
        let angle = m.snapshot().render_angle();
        assert!((0.0..std::f32::consts::TAU).contains(&angle));
        let expected = m.snapshot().rotation.rem_euclid(TAU);
        assert!((f64::from(angle) - expected).abs() < 1e-5);
        m.drive();
        for _ in 0..2000 {
            m.smooth();
        }
        let moved = f64::from(m.snapshot().render_angle()) - expected;
        assert!((moved - f64::from(BASE)).abs() < 1e-5, "moved {}", moved);
    }

    #[test]
    fn velocity_decays_after_release() {
        let mut m = motion();
        m.pointer_down(0.0);
        m.pointer_move(50.0);
        m.pointer_up();
        let v0 = m.velocity();
        m.advance();
        assert!((m.velocity() - v0 * VELOCITY_DECAY).abs() < 1e-6);
        for _ in 0..500 {
            m.advance();
        }
        assert!(m.velocity().abs() < 1e-9);
    }

    #[test]
    fn disabled_drag_ignores_pointer() {
        let mut m = RingMotion::new(BASE, true, false, false);
        m.pointer_down(0.0);
        m.pointer_move(100.0);
        assert_eq!(m.snapshot().phase, Phase::AutoRotating);
        assert_eq!(m.target_rotation(), 0.0);
        assert_eq!(m.velocity(), 0.0);
        assert!(m.last_press_was_click());
    }

    #[test]
    fn short_press_is_a_click_long_drag_is_not() {
        let mut m = motion();
        m.pointer_down(100.0);
        m.pointer_move(102.0);
        m.pointer_move(99.0);
        m.pointer_up();
        assert!(m.last_press_was_click());

        m.pointer_down(100.0);
        m.pointer_move(140.0);
        m.pointer_up();
        assert!(!m.last_press_was_click());

        m.pointer_down(0.0);
        assert!(m.last_press_was_click());
    }

    #[test]
    fn disabled_auto_rotation_holds_target() {
        let mut m = RingMotion::new(BASE, false, true, false);
        for _ in 0..10 {
            m.advance();
        }
        assert_eq!(m.target_rotation(), 0.0);
    }

    #[test]
    fn smoothing_converges_without_overshoot() {
        let mut m = RingMotion::new(0.0, false, true, true);
        m.wheel(1000.0);
        let target = m.target_rotation();
        let mut previous = m.snapshot().rotation;
        for _ in 0..300 {
            m.advance();
            let rotation = m.snapshot().rotation;
            assert!(rotation >= previous);
            assert!(rotation <= target);
            previous = rotation;
        }
        assert!((target - previous).abs() < 1e-4);
    }

    #[test]
    fn smoothing_moves_a_tenth_each_frame() {
        let mut m = RingMotion::new(0.0, false, true, true);
        m.wheel(1000.0);
        m.advance();
        assert!((m.snapshot().rotation - 0.1).abs() < 1e-6);
    }

    #[test]
    fn steps_change_active_card() {
        let mut m = motion();
        m.step_next(8);
        assert_eq!(active_index(m.target_rotation(), 8), Some(1));
        m.step_prev(8);
        m.step_prev(8);
        assert_eq!(active_index(m.target_rotation(), 8), Some(7));
    }

    #[test]
    fn jump_takes_the_short_way() {
        let mut m = motion();
        m.jump_to(7, 8);
        assert_eq!(active_index(m.target_rotation(), 8), Some(7));
        assert!((m.target_rotation() - TAU / 8.0).abs() < 1e-9);

        let mut m = motion();
        m.jump_to(3, 8);
        assert_eq!(active_index(m.target_rotation(), 8), Some(3));
        assert!(m.target_rotation() < 0.0);
    }

    #[test]
    fn jump_out_of_range_is_ignored() {
        let mut m = motion();
        m.jump_to(9, 8);
        m.jump_to(0, 0);
        assert_eq!(m.target_rotation(), 0.0);
    }
}
