//! Per-frame view and world transform math shared by the eye and mirror
//! passes. Pure functions so the composition rules are testable without a
//! GPU in sight.

use glam::{Mat4, Vec3};

/// Near clip plane used for every projection in the session.
pub const NEAR: f32 = 0.01;
/// Far clip plane used for every projection in the session.
pub const FAR: f32 = 1000.0;

/// Audio pulse coefficient for the primary scene mesh.
pub const SCENE_PULSE: f32 = 0.1;
/// Audio pulse coefficient for controller meshes.
pub const CONTROLLER_PULSE: f32 = 0.5;

/// Z offset of the left channel's waveform strip.
pub const LEFT_WAVEFORM_Z: f32 = 1.0;
/// Z offset of the right channel's waveform strip.
pub const RIGHT_WAVEFORM_Z: f32 = -1.0;

/// View matrix for one eye: the inverse of the eye-to-tracking transform.
#[inline]
pub fn eye_view(eye_to_head: Mat4, head: Mat4) -> Mat4 {
    (head * eye_to_head).inverse()
}

/// View matrix for the mirror window: straight inverse of the head pose.
#[inline]
pub fn mirror_view(head: Mat4) -> Mat4 {
    head.inverse()
}

/// Uniform pulse scale driven by the newest capture sample.
#[inline]
pub fn pulse_scale(amplitude: f32, k: f32) -> f32 {
    1.0 + amplitude.abs() * k
}

/// World transform of the primary scene mesh: pulse, then lift one meter.
pub fn scene_world(amplitude: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0))
        * Mat4::from_scale(Vec3::splat(pulse_scale(amplitude, SCENE_PULSE)))
}

/// World transform of a controller: pulse in device space, then its pose.
pub fn controller_world(pose: Mat4, amplitude: f32) -> Mat4 {
    pose * Mat4::from_scale(Vec3::splat(pulse_scale(amplitude, CONTROLLER_PULSE)))
}

/// Fixed world transform of a waveform strip; the two channels sit one
/// meter in front of and behind the stage origin.
pub fn waveform_world(z_offset: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(0.0, 1.0, z_offset))
        * Mat4::from_scale(Vec3::new(100.0, 2.5, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec4};

    fn head_pose() -> Mat4 {
        Mat4::from_rotation_translation(
            Quat::from_rotation_y(0.4),
            Vec3::new(0.1, 1.6, -0.2),
        )
    }

    #[test]
    fn eye_and_mirror_views_agree_for_identity_eye_offset() {
        let head = head_pose();
        let eye = eye_view(Mat4::IDENTITY, head);
        let mirror = mirror_view(head);
        assert!(eye.abs_diff_eq(mirror, 1e-6));
    }

    #[test]
    fn eye_view_undoes_the_eye_to_tracking_transform() {
        let head = head_pose();
        let eye_to_head = Mat4::from_translation(Vec3::new(-0.032, 0.0, 0.0));
        let view = eye_view(eye_to_head, head);

        // The eye's own origin must land at the view-space origin.
        let eye_origin = (head * eye_to_head) * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let back = view * eye_origin;
        assert!(back.abs_diff_eq(Vec4::new(0.0, 0.0, 0.0, 1.0), 1e-5));
    }

    #[test]
    fn pulse_coefficients_match_roles() {
        assert_eq!(pulse_scale(0.5, SCENE_PULSE), 1.05);
        assert_eq!(pulse_scale(-0.5, CONTROLLER_PULSE), 1.25);
        assert_eq!(pulse_scale(0.0, SCENE_PULSE), 1.0);
    }

    #[test]
    fn waveform_channels_sit_on_opposite_sides() {
        let left = waveform_world(LEFT_WAVEFORM_Z).transform_point3(Vec3::ZERO);
        let right = waveform_world(RIGHT_WAVEFORM_Z).transform_point3(Vec3::ZERO);
        assert_eq!(left, Vec3::new(0.0, 1.0, 1.0));
        assert_eq!(right, Vec3::new(0.0, 1.0, -1.0));
    }

    #[test]
    fn scene_world_scales_about_the_lifted_origin() {
        let w = scene_world(0.0);
        assert_eq!(w.transform_point3(Vec3::ZERO), Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn controller_pulse_happens_in_device_space() {
        let pose = Mat4::from_translation(Vec3::new(0.3, 1.2, -0.4));
        let w = controller_world(pose, 1.0);
        // Device origin is unaffected by the scale.
        assert!(w
            .transform_point3(Vec3::ZERO)
            .abs_diff_eq(Vec3::new(0.3, 1.2, -0.4), 1e-6));
        // A unit offset stretches by 1.5.
        let p = w.transform_point3(Vec3::X) - w.transform_point3(Vec3::ZERO);
        assert!(p.abs_diff_eq(Vec3::new(1.5, 0.0, 0.0), 1e-6));
    }
}
