//! Motion-driven warp using dense optical flow between consecutive frames.

use crate::error::CoreError;
use crate::flow::compute_optical_flow;
use crate::frame::{Frame, GrayFrame};
use crate::transform::remap;

/// Cross-frame memory of the flow warp: the grayscale copy of the last frame
/// it saw. Outlives the per-tick pipeline and is lent to each new unit.
#[derive(Debug, Clone, Default)]
pub struct FlowState {
    prev_gray: Option<GrayFrame>,
}

impl FlowState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once a reference frame has been stored.
    pub fn is_primed(&self) -> bool {
        self.prev_gray.is_some()
    }

    /// Dimensions of the stored reference frame, if any.
    pub fn reference_dimensions(&self) -> Option<(u32, u32)> {
        self.prev_gray.as_ref().map(GrayFrame::dimensions)
    }

    /// Forget the reference frame. The next frame primes again.
    pub fn reset(&mut self) {
        self.prev_gray = None;
    }
}

/// Warps the color frame along the motion measured since the previous frame.
///
/// The first frame after construction of the state (or after a reset) only
/// primes the state and passes through untouched.
#[derive(Debug)]
pub struct FlowWarp<'s> {
    pub strength: f32,
    state: &'s mut FlowState,
}

impl<'s> FlowWarp<'s> {
    pub fn new(strength: f32, state: &'s mut FlowState) -> Self {
        Self { strength, state }
    }

    pub fn apply(&mut self, frame: &Frame) -> Result<Frame, CoreError> {
        let gray = frame.to_gray();
        let Some(prev) = self.state.prev_gray.take() else {
            self.state.prev_gray = Some(gray);
            return Ok(frame.clone());
        };

        if prev.dimensions() != gray.dimensions() {
            let err = CoreError::ShapeMismatch {
                expected: prev.dimensions(),
                actual: gray.dimensions(),
            };
            self.state.prev_gray = Some(prev);
            return Err(err);
        }

        if self.strength == 0.0 {
            self.state.prev_gray = Some(gray);
            return Ok(frame.clone());
        }

        let flow = compute_optical_flow(&prev, &gray)?;
        self.state.prev_gray = Some(gray);

        let strength = self.strength;
        Ok(remap(frame, |x, y| flow.get(x, y) * strength))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(w: u32, h: u32) -> Frame {
        Frame::from_fn(w, h, |x, y| {
            if (x / 4 + y / 4) % 2 == 0 {
                [230, 40, 40]
            } else {
                [20, 20, 160]
            }
        })
    }

    #[test]
    fn test_first_call_primes_and_passes_through() {
        let mut state = FlowState::new();
        let frame = checker(40, 40);
        let out = FlowWarp::new(5.0, &mut state).apply(&frame).unwrap();
        assert_eq!(out, frame);
        assert!(state.is_primed());
        assert_eq!(state.reference_dimensions(), Some((40, 40)));
    }

    #[test]
    fn test_solid_frames_are_left_in_place() {
        let mut state = FlowState::new();
        let first = Frame::filled(48, 48, [60, 60, 60]);
        let second = Frame::filled(48, 48, [180, 180, 180]);
        FlowWarp::new(20.0, &mut state).apply(&first).unwrap();
        let out = FlowWarp::new(20.0, &mut state).apply(&second).unwrap();
        assert_eq!(out, second);
    }

    fn blob(cx: f32) -> Frame {
        Frame::from_fn(64, 64, |x, y| {
            let d2 = (x as f32 - cx).powi(2) + (y as f32 - 32.0).powi(2);
            let v = (30.0 + 200.0 * (-d2 / 50.0).exp()) as u8;
            [v, v, v]
        })
    }

    #[test]
    fn test_moving_blob_is_displaced() {
        let mut state = FlowState::new();
        FlowWarp::new(20.0, &mut state).apply(&blob(28.0)).unwrap();
        let moved = blob(30.0);
        let out = FlowWarp::new(20.0, &mut state).apply(&moved).unwrap();

        let changed = out
            .pixels()
            .iter()
            .zip(moved.pixels())
            .filter(|(a, b)| a != b)
            .count();
        assert!(changed > 100, "only {changed} pixels changed");
    }

    #[test]
    fn test_mismatched_dimensions_fail() {
        let mut state = FlowState::new();
        FlowWarp::new(5.0, &mut state)
            .apply(&Frame::filled(32, 32, [0, 0, 0]))
            .unwrap();
        let err = FlowWarp::new(5.0, &mut state)
            .apply(&Frame::filled(40, 32, [0, 0, 0]))
            .unwrap_err();
        assert_eq!(
            err,
            CoreError::ShapeMismatch {
                expected: (32, 32),
                actual: (40, 32),
            }
        );
    }

    #[test]
    fn test_zero_strength_still_checks_shape() {
        let mut state = FlowState::new();
        FlowWarp::new(0.0, &mut state)
            .apply(&Frame::filled(16, 16, [9, 9, 9]))
            .unwrap();
        assert!(
            FlowWarp::new(0.0, &mut state)
                .apply(&Frame::filled(16, 8, [9, 9, 9]))
                .is_err()
        );
    }

    #[test]
    fn test_state_tracks_latest_frame() {
        let mut state = FlowState::new();
        let frame = checker(32, 32);
        FlowWarp::new(0.0, &mut state).apply(&frame).unwrap();
        FlowWarp::new(0.0, &mut state).apply(&frame).unwrap();
        assert!(state.is_primed());
        state.reset();
        assert!(!state.is_primed());
    }
}
