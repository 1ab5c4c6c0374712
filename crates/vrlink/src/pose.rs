//! Rigid-transform conversion and per-slot pose retention.
//!
//! Runtimes report transforms as 3x4 (or 4x4 for projections) row-major
//! arrays; glam wants column-major. The converters below fill columns from
//! rows, so translation lands in the w column.

use crate::runtime::VrRuntime;
use crate::types::{DeviceSlot, TrackedPose};
use glam::{Mat4, Vec4};

/// Converts a 3x4 row-major rigid transform (rotation + translation) into a
/// column-major `Mat4` with an implicit `[0 0 0 1]` bottom row.
#[inline]
pub fn mat4_from_rigid_rows(m: &[[f32; 4]; 3]) -> Mat4 {
    Mat4::from_cols(
        Vec4::new(m[0][0], m[1][0], m[2][0], 0.0),
        Vec4::new(m[0][1], m[1][1], m[2][1], 0.0),
        Vec4::new(m[0][2], m[1][2], m[2][2], 0.0),
        Vec4::new(m[0][3], m[1][3], m[2][3], 1.0),
    )
}

/// Converts a full 4x4 row-major matrix (projections) into a `Mat4`.
#[inline]
pub fn mat4_from_rows(m: &[[f32; 4]; 4]) -> Mat4 {
    // from_cols_array_2d reads the outer index as columns; transpose fixes
    // the row-major input up.
    Mat4::from_cols_array_2d(m).transpose()
}

/// Per-slot retained transforms, refreshed from the runtime each frame.
///
/// An invalid pose leaves the slot's previous transform untouched; slots
/// start at identity, which doubles as the headset fallback when it has
/// never been tracked.
pub struct PoseTracker {
    retained: Vec<Mat4>,
    current: Vec<TrackedPose>,
    predicted: Vec<TrackedPose>,
    headset: Option<DeviceSlot>,
}

impl PoseTracker {
    pub fn new(slot_count: u32) -> Self {
        let n = slot_count as usize;
        Self {
            retained: vec![Mat4::IDENTITY; n],
            current: vec![TrackedPose::default(); n],
            predicted: vec![TrackedPose::default(); n],
            headset: None,
        }
    }

    /// Designates which slot's transform `head()` reads.
    pub fn set_headset(&mut self, slot: Option<DeviceSlot>) {
        self.headset = slot;
    }

    /// Pulls current and predicted poses for every slot in one runtime call
    /// and folds valid ones into the retained set.
    pub fn update(&mut self, runtime: &mut dyn VrRuntime) {
        runtime.wait_poses(&mut self.current, &mut self.predicted);
        for (slot, pose) in self.current.iter().enumerate() {
            if pose.valid {
                self.retained[slot] = pose.transform;
            }
        }
    }

    /// Last known device-to-tracking transform for a slot.
    #[inline]
    pub fn transform(&self, slot: DeviceSlot) -> Mat4 {
        self.retained
            .get(slot as usize)
            .copied()
            .unwrap_or(Mat4::IDENTITY)
    }

    /// The current view origin. Identity until a headset pose was seen.
    #[inline]
    pub fn head(&self) -> Mat4 {
        self.headset.map_or(Mat4::IDENTITY, |s| self.transform(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimRuntime;
    use glam::Vec3;

    #[test]
    fn rigid_rows_map_translation_to_w_column() {
        // Identity rotation, translation (1, 2, 3).
        let rows = [
            [1.0, 0.0, 0.0, 1.0],
            [0.0, 1.0, 0.0, 2.0],
            [0.0, 0.0, 1.0, 3.0],
        ];
        let m = mat4_from_rigid_rows(&rows);
        assert_eq!(
            m.transform_point3(Vec3::ZERO),
            Vec3::new(1.0, 2.0, 3.0)
        );
    }

    #[test]
    fn full_rows_round_trip_through_transpose() {
        let rows = [
            [1.0, 0.0, 0.5, 0.0],
            [0.0, 1.0, 0.25, 0.0],
            [0.0, 0.0, -1.0, -0.02],
            [0.0, 0.0, -1.0, 0.0],
        ];
        let m = mat4_from_rows(&rows);
        // Row 2 of the input becomes accessible via the columns.
        assert_eq!(m.col(2).x, 0.5);
        assert_eq!(m.col(3).z, -0.02);
    }

    #[test]
    fn invalid_pose_retains_previous_transform() {
        let mut rt = SimRuntime::new();
        let mut poses = PoseTracker::new(rt.slot_count());
        poses.set_headset(Some(0));

        poses.update(&mut rt);
        let tracked = poses.transform(1);
        assert_ne!(tracked, Mat4::IDENTITY);

        // Untrack the controller; its retained transform must not reset.
        rt.set_connected(1, false);
        poses.update(&mut rt);
        assert_eq!(poses.transform(1), tracked);
    }

    #[test]
    fn headset_falls_back_to_identity() {
        let poses = PoseTracker::new(4);
        assert_eq!(poses.head(), Mat4::IDENTITY);
        assert_eq!(poses.transform(99), Mat4::IDENTITY);
    }
}
