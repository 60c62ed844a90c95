//! Selection state machine and blink timer
//!
//! The marker is either `Moving` (blinking between the neutral and blink
//! colors while the player picks a square) or `Selected` (frozen in the
//! highlight color). Movement is limited to a rectangle on the XZ plane.

use crate::scene::Transform;
use glam::{Mat4, Vec3, Vec4};
use std::time::Duration;

/// Whether the marker is still being moved or has been locked in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionStatus {
    #[default]
    Moving,
    Selected,
}

/// Colors used by the marker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlinkPalette {
    /// Resting color, also the initial color
    pub neutral: Vec4,
    /// Alternate color shown on every other blink
    pub blink: Vec4,
    /// Color while selected
    pub highlight: Vec4,
}

impl Default for BlinkPalette {
    fn default() -> Self {
        Self {
            neutral: Vec4::new(0.5, 0.5, 0.5, 1.0),
            blink: Vec4::new(1.0, 1.0, 1.0, 1.0),
            highlight: Vec4::new(1.0, 1.0, 0.0, 1.0),
        }
    }
}

/// Inclusive range allowed for the X and Z coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementBounds {
    pub min: f32,
    pub max: f32,
}

impl Default for MovementBounds {
    fn default() -> Self {
        Self { min: -0.8, max: 0.6 }
    }
}

impl MovementBounds {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Position, color and status of the marker
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionState {
    status: SelectionStatus,
    position: Vec3,
    color: Vec4,
    palette: BlinkPalette,
    bounds: MovementBounds,
}

impl SelectionState {
    /// Start `Moving` at `position` in the neutral color
    pub fn new(position: Vec3, palette: BlinkPalette, bounds: MovementBounds) -> Self {
        Self {
            status: SelectionStatus::Moving,
            position,
            color: palette.neutral,
            palette,
            bounds,
        }
    }

    pub fn status(&self) -> SelectionStatus {
        self.status
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn color(&self) -> Vec4 {
        self.color
    }

    pub fn palette(&self) -> &BlinkPalette {
        &self.palette
    }

    pub fn bounds(&self) -> &MovementBounds {
        &self.bounds
    }

    pub fn is_selected(&self) -> bool {
        self.status == SelectionStatus::Selected
    }

    /// Lock in (`true`) or release (`false`) the marker
    ///
    /// Selecting always switches to the highlight color. Releasing keeps the
    /// current color; the next blink takes it back to neutral.
    pub fn select(&mut self, selected: bool) {
        if selected {
            self.status = SelectionStatus::Selected;
            self.color = self.palette.highlight;
        } else {
            self.status = SelectionStatus::Moving;
        }
    }

    /// Toggle between the neutral and blink colors while `Moving`
    pub fn blink(&mut self) {
        if self.status != SelectionStatus::Moving {
            return;
        }
        self.color = if self.color == self.palette.neutral {
            self.palette.blink
        } else {
            self.palette.neutral
        };
    }

    /// Move along X unless the result would leave the bounds
    ///
    /// Returns whether the move was applied. Rejected moves leave the
    /// position unchanged; there is no clamping.
    pub fn move_along_x(&mut self, delta: f32) -> bool {
        let x = self.position.x + delta;
        if !self.bounds.contains(x) {
            return false;
        }
        self.position.x = x;
        true
    }

    /// Move along Z unless the result would leave the bounds
    pub fn move_along_z(&mut self, delta: f32) -> bool {
        let z = self.position.z + delta;
        if !self.bounds.contains(z) {
            return false;
        }
        self.position.z = z;
        true
    }

    pub fn transform(&self, scale: f32) -> Transform {
        Transform::from_position_scale(self.position, Vec3::splat(scale))
    }

    /// Model matrix: uniform `scale`, then translation to the position
    pub fn model_matrix(&self, scale: f32) -> Mat4 {
        self.transform(scale).matrix()
    }
}

/// Polled interval timer
///
/// Elapsed time accumulates across [`BlinkTimer::tick`] calls. Once it
/// reaches the interval the tick reports `true` and the timer restarts from
/// zero; any overshoot is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkTimer {
    interval: Duration,
    elapsed: Duration,
}

impl BlinkTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            elapsed: Duration::ZERO,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn restart(&mut self) {
        self.elapsed = Duration::ZERO;
    }

    /// Advance by `dt`; `true` when the interval has elapsed
    pub fn tick(&mut self, dt: Duration) -> bool {
        self.elapsed = self.elapsed.saturating_add(dt);
        if self.elapsed < self.interval {
            return false;
        }
        self.restart();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn state() -> SelectionState {
        SelectionState::new(Vec3::ZERO, BlinkPalette::default(), MovementBounds::new(-1.0, 0.5))
    }

    #[test]
    fn test_initial_state() {
        let state = state();
        assert_eq!(state.status(), SelectionStatus::Moving);
        assert_eq!(state.color(), BlinkPalette::default().neutral);
        assert_eq!(state.position(), Vec3::ZERO);
    }

    #[test]
    fn test_blink_toggles_while_moving() {
        let palette = BlinkPalette::default();
        let mut state = state();
        state.blink();
        assert_eq!(state.color(), palette.blink);
        state.blink();
        assert_eq!(state.color(), palette.neutral);
    }

    #[test]
    fn test_select_freezes_highlight() {
        let palette = BlinkPalette::default();
        let mut state = state();
        state.blink();
        state.select(true);
        assert_eq!(state.status(), SelectionStatus::Selected);
        assert_eq!(state.color(), palette.highlight);

        for _ in 0..5 {
            state.blink();
            assert_eq!(state.color(), palette.highlight);
        }
    }

    #[test]
    fn test_select_twice_stays_selected() {
        let mut state = state();
        state.select(true);
        state.select(true);
        assert!(state.is_selected());
        assert_eq!(state.color(), BlinkPalette::default().highlight);
    }

    #[test]
    fn test_deselect_keeps_color_until_next_blink() {
        let palette = BlinkPalette::default();
        let mut state = state();
        state.select(true);
        state.select(false);
        assert_eq!(state.status(), SelectionStatus::Moving);
        assert_eq!(state.color(), palette.highlight);

        state.blink();
        assert_eq!(state.color(), palette.neutral);
        state.blink();
        assert_eq!(state.color(), palette.blink);
    }

    #[rstest]
    #[case(0.5, true)]
    #[case(0.25, true)]
    #[case(-1.0, true)]
    #[case(-0.5, true)]
    #[case(f32::from_bits(0.5f32.to_bits() + 1), false)]
    #[case(-1.0 - f32::EPSILON, false)]
    #[case(2.0, false)]
    fn test_move_along_x_bounds(#[case] delta: f32, #[case] accepted: bool) {
        let mut state = state();
        assert_eq!(state.move_along_x(delta), accepted);
        let expected = if accepted { delta } else { 0.0 };
        assert_eq!(state.position().x, expected);
        assert_eq!(state.position().z, 0.0);
    }

    #[rstest]
    #[case(0.5, true)]
    #[case(f32::from_bits(0.5f32.to_bits() + 1), false)]
    #[case(-1.0, true)]
    #[case(-1.5, false)]
    fn test_move_along_z_bounds(#[case] delta: f32, #[case] accepted: bool) {
        let mut state = state();
        assert_eq!(state.move_along_z(delta), accepted);
        let expected = if accepted { delta } else { 0.0 };
        assert_eq!(state.position().z, expected);
        assert_eq!(state.position().x, 0.0);
    }

    #[test]
    fn test_rejected_move_is_not_clamped() {
        let mut state = state();
        assert!(state.move_along_x(0.25));
        assert!(!state.move_along_x(0.5));
        assert_eq!(state.position().x, 0.25);
    }

    #[test]
    fn test_movement_ignores_status() {
        let mut state = state();
        state.select(true);
        assert!(state.move_along_z(-0.5));
        assert_eq!(state.position().z, -0.5);
    }

    #[test]
    fn test_model_matrix_translates_and_scales() {
        let mut state = state();
        state.move_along_x(0.5);
        let model = state.model_matrix(0.45);
        let origin = model.transform_point3(Vec3::ZERO);
        let unit = model.transform_point3(Vec3::X);
        assert!(origin.abs_diff_eq(Vec3::new(0.5, 0.0, 0.0), 1e-6));
        assert!((unit.x - origin.x - 0.45).abs() < 1e-6);
    }

    #[test]
    fn test_timer_fires_at_interval_and_restarts() {
        let mut timer = BlinkTimer::new(Duration::from_millis(100));
        assert!(!timer.tick(Duration::from_millis(60)));
        assert!(timer.tick(Duration::from_millis(40)));
        assert_eq!(timer.elapsed(), Duration::ZERO);
        assert!(!timer.tick(Duration::from_millis(99)));
    }

    #[test]
    fn test_timer_drops_overshoot() {
        let mut timer = BlinkTimer::new(Duration::from_millis(100));
        assert!(timer.tick(Duration::from_millis(250)));
        assert!(!timer.tick(Duration::from_millis(10)));
        assert_eq!(timer.elapsed(), Duration::from_millis(10));
    }
}
