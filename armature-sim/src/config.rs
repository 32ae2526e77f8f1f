// Copyright (C) 2024 Laixer Equipment B.V.
// All rights reserved.
//
// This software may be modified and distributed under the terms
// of the included license.  See the LICENSE file for details.

use armature_core::algorithm::interpolate::Interpolator;
use armature_core::algorithm::root::RootConfig;
use armature_core::{ConfigError, EngineSettings};
use nalgebra::Point2;

const fn default_frame_rate() -> u32 {
    60
}
const fn default_width() -> u32 {
    800
}
const fn default_height() -> u32 {
    600
}
const fn default_fraction() -> f64 {
    0.08
}
const fn default_epsilon() -> f64 {
    1e-3
}
const fn default_tolerance() -> f64 {
    1e-6
}
const fn default_max_iterations() -> u32 {
    100
}
const fn default_click_threshold() -> f64 {
    5.0
}
const fn default_click_interval() -> u64 {
    90
}

#[derive(Clone, Debug, serde_derive::Deserialize, PartialEq, Eq)]
pub struct ViewportConfig {
    /// Viewport width in pixels.
    #[serde(default = "default_width")]
    pub width: u32,
    /// Viewport height in pixels.
    #[serde(default = "default_height")]
    pub height: u32,
}

impl ViewportConfig {
    /// The arm is mounted at the centre of the viewport.
    pub fn center(&self) -> Point2<f64> {
        Point2::new(self.width as f64 / 2.0, self.height as f64 / 2.0)
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

#[derive(Clone, Debug, serde_derive::Deserialize, PartialEq)]
pub struct AnimationConfig {
    /// Fraction of the remaining rotation covered per frame.
    #[serde(default = "default_fraction")]
    pub fraction: f64,
    /// Angular distance in radians at which the animation completes.
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    /// Maximum angular step per frame in radians.
    pub max_step: Option<f64>,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            fraction: default_fraction(),
            epsilon: default_epsilon(),
            max_step: None,
        }
    }
}

#[derive(Clone, Debug, serde_derive::Deserialize, PartialEq)]
pub struct SolverConfig {
    /// End-effector distance at which a numerical solve succeeds.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Iteration budget of the numerical solvers.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            max_iterations: default_max_iterations(),
        }
    }
}

#[derive(Clone, Debug, serde_derive::Deserialize, PartialEq, Eq)]
pub struct OrbitConfig {
    /// Frames between synthetic clicks.
    #[serde(default = "default_click_interval")]
    pub click_interval: u64,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            click_interval: default_click_interval(),
        }
    }
}

#[derive(Clone, Debug, serde_derive::Deserialize, PartialEq)]
pub struct SimConfig {
    /// Frames per second, zero runs unpaced.
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
    /// Viewport configuration.
    #[serde(default)]
    pub viewport: ViewportConfig,
    /// Animation configuration.
    #[serde(default)]
    pub animation: AnimationConfig,
    /// Numerical solver configuration.
    #[serde(default)]
    pub solver: SolverConfig,
    /// Clicks closer than this to the current destination are ignored.
    #[serde(default = "default_click_threshold")]
    pub click_threshold: f64,
    /// Synthetic input used when no script is given.
    #[serde(default)]
    pub orbit: OrbitConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            frame_rate: default_frame_rate(),
            viewport: ViewportConfig::default(),
            animation: AnimationConfig::default(),
            solver: SolverConfig::default(),
            click_threshold: default_click_threshold(),
            orbit: OrbitConfig::default(),
        }
    }
}

impl SimConfig {
    /// Load the configuration from a TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        use anyhow::Context;

        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Frame period, `None` when running unpaced.
    pub fn frame_period(&self) -> Option<std::time::Duration> {
        (self.frame_rate > 0)
            .then(|| std::time::Duration::from_secs_f64(1.0 / self.frame_rate as f64))
    }

    /// Engine settings derived from this configuration.
    pub fn engine_settings(&self) -> Result<EngineSettings, ConfigError> {
        if !(self.solver.tolerance > 0.0) {
            return Err(ConfigError::SolverTolerance(self.solver.tolerance));
        }

        Ok(EngineSettings {
            origin: self.viewport.center(),
            interpolator: Interpolator::new(
                self.animation.fraction,
                self.animation.epsilon,
                self.animation.max_step,
            )?,
            solver: RootConfig {
                max_iterations: self.solver.max_iterations,
                tolerance: self.solver.tolerance,
                ..RootConfig::default()
            },
            click_threshold: self.click_threshold,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: SimConfig = toml::from_str("").unwrap();

        assert_eq!(config, SimConfig::default());
        assert_eq!(config.frame_rate, 60);
        assert_eq!(config.viewport.center(), Point2::new(400.0, 300.0));
        assert_eq!(config.animation.max_step, None);
        assert!((config.click_threshold - 5.0).abs() < f64::EPSILON);
        assert_eq!(config.orbit.click_interval, 90);
    }

    #[test]
    fn test_partial() {
        let config: SimConfig = toml::from_str(
            r"
            frame_rate = 0

            [viewport]
            width = 1024

            [animation]
            fraction = 0.2
            max_step = 0.05

            [solver]
            max_iterations = 50

            [orbit]
            click_interval = 30
            ",
        )
        .unwrap();

        assert_eq!(config.frame_rate, 0);
        assert_eq!(config.frame_period(), None);
        assert_eq!(config.viewport.width, 1024);
        assert_eq!(config.viewport.height, 600);
        assert!((config.animation.fraction - 0.2).abs() < f64::EPSILON);
        assert!((config.animation.epsilon - 1e-3).abs() < f64::EPSILON);
        assert_eq!(config.animation.max_step, Some(0.05));

        let settings = config.engine_settings().unwrap();
        assert_eq!(settings.origin, Point2::new(512.0, 300.0));
        assert_eq!(settings.solver.max_iterations, 50);
        assert_eq!(config.orbit.click_interval, 30);
        assert!((settings.solver.tolerance - 1e-6).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_animation() {
        let config: SimConfig = toml::from_str(
            r"
            [animation]
            fraction = 1.5
            ",
        )
        .unwrap();

        assert!(matches!(
            config.engine_settings(),
            Err(ConfigError::Interpolation(_))
        ));
    }

    #[test]
    fn test_frame_period() {
        let config = SimConfig::default();

        let period = config.frame_period().unwrap();
        assert!((period.as_secs_f64() - 1.0 / 60.0).abs() < 1e-9);
    }
}
