//! Frame-rate independent easing helpers.

/// Smallest vector length treated as non-zero before normalizing.
pub const EPSILON: f32 = 1e-4;

/// Reference frame rate the per-frame factors are tuned for.
const REFERENCE_HZ: f32 = 60.0;

/// Convert a lerp factor tuned for one 60 Hz frame into the factor for a frame
/// lasting `delta` seconds.
///
/// At exactly 1/60 s this returns `per_frame` unchanged; longer frames ease
/// further so the motion is independent of the display refresh rate.
pub fn per_frame_lerp(per_frame: f32, delta: f32) -> f32 {
    let per_frame = per_frame.clamp(0.0, 1.0);
    if delta <= 0.0 {
        return 0.0;
    }
    1.0 - (1.0 - per_frame).powf(delta * REFERENCE_HZ)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_frame_is_identity() {
        let f = per_frame_lerp(0.02, 1.0 / 60.0);
        assert!((f - 0.02).abs() < 1e-6, "got {f}");
    }

    #[test]
    fn test_two_short_frames_match_one_long_frame() {
        let short = per_frame_lerp(0.1, 1.0 / 120.0);
        let long = per_frame_lerp(0.1, 1.0 / 60.0);
        let combined = 1.0 - (1.0 - short) * (1.0 - short);
        assert!((combined - long).abs() < 1e-6);
    }

    #[test]
    fn test_zero_delta_does_not_move() {
        assert_eq!(per_frame_lerp(0.5, 0.0), 0.0);
        assert_eq!(per_frame_lerp(0.5, -1.0), 0.0);
    }

    #[test]
    fn test_result_stays_in_unit_range() {
        for delta in [0.001, 0.016, 0.25, 10.0] {
            let f = per_frame_lerp(0.9, delta);
            assert!((0.0..=1.0).contains(&f), "delta {delta} gave {f}");
        }
    }
}
