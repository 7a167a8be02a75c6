//! Aim rig derived from the player pose: look angles, eye, muzzle and rope attach point.
#![forbid(unsafe_code)]

use rapier3d::math::{Point, Vector};
use rapier3d::prelude::Real;

const PITCH_LIMIT: Real = 1.54;

#[derive(Clone, Copy, Debug)]
pub struct AimPose {
    pub eye: Point<Real>,
    pub look_dir: Vector<Real>,
    /// Muzzle of the hand-held launcher.
    pub hand: Point<Real>,
    /// Where the rope attaches to the body.
    pub chest: Point<Real>,
    pub yaw: Real,
    pub pitch: Real,
}

#[derive(Clone, Copy, Debug)]
pub struct AimRig {
    eye_height: Real,
    chest_height: Real,
    /// Muzzle offset from the eye as `[right, up, forward]`.
    hand_offset: [Real; 3],
    yaw: Real,
    pitch: Real,
}

impl AimRig {
    pub fn new(eye_height: Real, chest_height: Real, hand_offset: [Real; 3]) -> Self {
        Self {
            eye_height,
            chest_height,
            hand_offset,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    pub fn yaw(&self) -> Real {
        self.yaw
    }

    pub fn pitch(&self) -> Real {
        self.pitch
    }

    pub fn set_look(&mut self, yaw: Real, pitch: Real) {
        self.yaw = yaw;
        self.pitch = pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn apply_look_delta(&mut self, delta: [Real; 2]) {
        self.yaw += delta[0];
        self.pitch = (self.pitch + delta[1]).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Planar facing; yaw 0 looks down -z.
    pub fn forward(&self) -> Vector<Real> {
        Vector::new(self.yaw.sin(), 0.0, -self.yaw.cos())
    }

    pub fn right(&self) -> Vector<Real> {
        Vector::new(self.yaw.cos(), 0.0, self.yaw.sin())
    }

    /// Unit view direction; positive pitch looks up.
    pub fn look_dir(&self) -> Vector<Real> {
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        Vector::new(
            self.yaw.sin() * cos_pitch,
            sin_pitch,
            -self.yaw.cos() * cos_pitch,
        )
    }

    pub fn pose(&self, origin: Point<Real>) -> AimPose {
        let eye = origin + Vector::y() * self.eye_height;
        let [right, up, forward] = self.hand_offset;
        let hand = eye + self.right() * right + Vector::y() * up + self.forward() * forward;
        AimPose {
            eye,
            look_dir: self.look_dir(),
            hand,
            chest: origin + Vector::y() * self.chest_height,
            yaw: self.yaw,
            pitch: self.pitch,
        }
    }
}

impl Default for AimRig {
    fn default() -> Self {
        Self::new(0.7, 0.3, [0.3, -0.25, 0.4])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn basis_follows_yaw() {
        let mut rig = AimRig::default();
        assert_relative_eq!(rig.forward(), Vector::new(0.0, 0.0, -1.0));
        assert_relative_eq!(rig.right(), Vector::new(1.0, 0.0, 0.0));
        rig.set_look(FRAC_PI_2, 0.0);
        assert_relative_eq!(rig.forward(), Vector::new(1.0, 0.0, 0.0), epsilon = 1.0e-6);
        assert_relative_eq!(rig.right(), Vector::new(0.0, 0.0, 1.0), epsilon = 1.0e-6);
    }

    #[test]
    fn pitch_is_clamped_and_tilts_look() {
        let mut rig = AimRig::default();
        rig.apply_look_delta([0.0, 10.0]);
        assert_relative_eq!(rig.pitch(), PITCH_LIMIT);
        assert!(rig.look_dir().y > 0.99);
        assert_relative_eq!(rig.look_dir().norm(), 1.0, epsilon = 1.0e-6);
    }

    #[test]
    fn pose_places_points_relative_to_origin() {
        let rig = AimRig::new(0.7, 0.3, [0.3, -0.25, 0.4]);
        let pose = rig.pose(Point::new(1.0, 2.0, 3.0));
        assert_relative_eq!(pose.eye, Point::new(1.0, 2.7, 3.0), epsilon = 1.0e-5);
        assert_relative_eq!(pose.chest, Point::new(1.0, 2.3, 3.0), epsilon = 1.0e-5);
        assert_relative_eq!(pose.hand, Point::new(1.3, 2.45, 2.6), epsilon = 1.0e-5);
    }
}
