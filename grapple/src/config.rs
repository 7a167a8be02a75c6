//! Tuning for the grapple engine, loadable from TOML.

use std::fs;
use std::path::Path;

use rapier3d::prelude::Real;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read grapple config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse grapple config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid grapple config: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrappleConfig {
    /// Longest hand-to-anchor shot in meters.
    pub max_range: Real,
    /// How far the eye ray probes when resolving the aim target.
    pub aim_probe_distance: Real,
    /// Collision-group bits the grapple queries interact with.
    pub query_mask: u32,

    pub max_charges: u32,
    /// Seconds to regenerate one charge.
    pub recharge_interval: Real,

    pub gravity: Real,
    /// Rope shortening rate in meters/sec far from the anchor.
    pub reel_speed: Real,
    pub min_rope_length: Real,
    /// Lateral steering turn rate in radians/sec.
    pub steer_rate: Real,
    /// Forward "pump" acceleration along the current velocity.
    pub pump_accel: Real,
    /// Fraction of horizontal speed removed per second while braking.
    pub brake_rate: Real,

    /// Angular rate about the anchor (radians/sec) under which the climb assist engages.
    pub assist_angular_threshold: Real,
    /// Seconds of low momentum before the assist engages on a non-fresh swing.
    pub assist_delay: Real,
    pub assist_ramp: Real,
    pub assist_pull: Real,
    /// Inward speed the assist accelerates toward and never beyond.
    pub assist_climb_speed: Real,

    /// Rope length under which the anchor push-out applies.
    pub short_rope_threshold: Real,
    pub short_rope_push: Real,

    pub damping_range: Real,
    pub damping_min: Real,
    /// Radians/sec.
    pub max_angular_rate: Real,
    pub max_tangential_speed: Real,
    pub max_horizontal_speed: Real,
    /// Fraction of the excess horizontal speed removed per second.
    pub horizontal_drag: Real,

    /// The obstruction detector runs once every this many active ticks.
    pub obstruction_interval_ticks: u32,
    pub capsule_radius: Real,
    pub shell_thickness: Real,
    /// Angular slices per capsule half.
    pub shell_segments: u32,
    /// Latitude bands per hemispherical cap.
    pub shell_cap_rings: u32,
    /// Angle kept free on both sides of the split plane, in radians.
    pub shell_split_gap: Real,
    /// Other colliders within this distance of the rope contact count as the same obstacle.
    pub same_obstacle_radius: Real,
    /// Largest tolerated rope deflection around an edge, in radians.
    pub bend_tolerance: Real,
    pub bend_grace_checks: u32,
    /// Release once the actor drifts beyond `max_range * safety_range_factor`.
    pub safety_range_factor: Real,

    /// Radians added to the exit pitch on a boosted release.
    pub boost_tilt: Real,
    pub boost_max_up_angle: Real,
    pub boost_min_speed: Real,
    /// Pre-boost speed at which `boost_max` applies.
    pub boost_full_speed: Real,
    pub boost_min: Real,
    pub boost_max: Real,
    pub boost_cooldown: Real,
}

impl Default for GrappleConfig {
    fn default() -> Self {
        Self {
            max_range: 40.0,
            aim_probe_distance: 200.0,
            query_mask: u32::MAX,
            max_charges: 2,
            recharge_interval: 3.0,
            gravity: 9.81,
            reel_speed: 1.5,
            min_rope_length: 2.0,
            steer_rate: 1.2,
            pump_accel: 4.0,
            brake_rate: 0.6,
            assist_angular_threshold: 0.25,
            assist_delay: 0.5,
            assist_ramp: 0.4,
            assist_pull: 16.0,
            assist_climb_speed: 3.0,
            short_rope_threshold: 2.5,
            short_rope_push: 3.0,
            damping_range: 4.0,
            damping_min: 0.15,
            max_angular_rate: 3.0,
            max_tangential_speed: 32.0,
            max_horizontal_speed: 45.0,
            horizontal_drag: 2.0,
            obstruction_interval_ticks: 4,
            capsule_radius: 0.6,
            shell_thickness: 0.12,
            shell_segments: 4,
            shell_cap_rings: 2,
            shell_split_gap: 10.0_f32.to_radians(),
            same_obstacle_radius: 1.5,
            bend_tolerance: 12.0_f32.to_radians(),
            bend_grace_checks: 3,
            safety_range_factor: 1.5,
            boost_tilt: 15.0_f32.to_radians(),
            boost_max_up_angle: 40.0_f32.to_radians(),
            boost_min_speed: 8.0,
            boost_full_speed: 40.0,
            boost_min: 2.0,
            boost_max: 6.0,
            boost_cooldown: 1.0,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConfigValidation {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ConfigValidation {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

impl GrappleConfig {
    pub fn parse_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        let validation = config.validate();
        for warning in &validation.warnings {
            log::warn!("grapple config: {}", warning);
        }
        if !validation.is_ok() {
            return Err(ConfigError::Invalid(validation.errors));
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse_toml(&text)
    }

    pub fn validate(&self) -> ConfigValidation {
        let mut validation = ConfigValidation::default();
        let positive = [
            ("max_range", self.max_range),
            ("aim_probe_distance", self.aim_probe_distance),
            ("recharge_interval", self.recharge_interval),
            ("min_rope_length", self.min_rope_length),
            ("damping_range", self.damping_range),
            ("max_angular_rate", self.max_angular_rate),
            ("max_tangential_speed", self.max_tangential_speed),
            ("max_horizontal_speed", self.max_horizontal_speed),
            ("capsule_radius", self.capsule_radius),
            ("shell_thickness", self.shell_thickness),
            ("safety_range_factor", self.safety_range_factor),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                validation
                    .errors
                    .push(format!("{} must be finite and > 0", name));
            }
        }
        let non_negative = [
            ("gravity", self.gravity),
            ("reel_speed", self.reel_speed),
            ("steer_rate", self.steer_rate),
            ("pump_accel", self.pump_accel),
            ("brake_rate", self.brake_rate),
            ("assist_angular_threshold", self.assist_angular_threshold),
            ("assist_delay", self.assist_delay),
            ("assist_ramp", self.assist_ramp),
            ("assist_pull", self.assist_pull),
            ("assist_climb_speed", self.assist_climb_speed),
            ("short_rope_threshold", self.short_rope_threshold),
            ("short_rope_push", self.short_rope_push),
            ("horizontal_drag", self.horizontal_drag),
            ("shell_split_gap", self.shell_split_gap),
            ("same_obstacle_radius", self.same_obstacle_radius),
            ("bend_tolerance", self.bend_tolerance),
            ("boost_tilt", self.boost_tilt),
            ("boost_max_up_angle", self.boost_max_up_angle),
            ("boost_min_speed", self.boost_min_speed),
            ("boost_min", self.boost_min),
            ("boost_max", self.boost_max),
            ("boost_cooldown", self.boost_cooldown),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                validation
                    .errors
                    .push(format!("{} must be finite and >= 0", name));
            }
        }
        if !(0.0..=1.0).contains(&self.damping_min) {
            validation
                .errors
                .push("damping_min must be within [0, 1]".to_string());
        }
        if self.max_charges == 0 {
            validation
                .warnings
                .push("max_charges is 0; the grapple can never fire".to_string());
        }
        if self.obstruction_interval_ticks == 0 {
            validation
                .errors
                .push("obstruction_interval_ticks must be >= 1".to_string());
        }
        if self.shell_segments == 0 {
            validation
                .errors
                .push("shell_segments must be >= 1".to_string());
        }
        if self.shell_thickness >= self.capsule_radius {
            validation
                .errors
                .push("shell_thickness must be smaller than capsule_radius".to_string());
        }
        if self.shell_split_gap >= std::f32::consts::FRAC_PI_2 {
            validation
                .errors
                .push("shell_split_gap must be below 90 degrees".to_string());
        }
        if self.boost_max < self.boost_min {
            validation
                .errors
                .push("boost_max must be >= boost_min".to_string());
        }
        if self.boost_full_speed <= self.boost_min_speed {
            validation.warnings.push(
                "boost_full_speed <= boost_min_speed; every boost uses boost_max".to_string(),
            );
        }
        if self.short_rope_threshold > self.min_rope_length * 4.0 {
            validation.warnings.push(format!(
                "short_rope_threshold {} is far above min_rope_length {}",
                self.short_rope_threshold, self.min_rope_length
            ));
        }
        if self.aim_probe_distance < self.max_range {
            validation
                .warnings
                .push("aim_probe_distance is shorter than max_range".to_string());
        }
        validation
    }

    /// Distance beyond which an active swing is force-released.
    pub fn safety_distance(&self) -> Real {
        self.max_range * self.safety_range_factor
    }
}
