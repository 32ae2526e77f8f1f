// Copyright (C) 2024 Laixer Equipment B.V.
// All rights reserved.
//
// This software may be modified and distributed under the terms
// of the included license.  See the LICENSE file for details.

use crate::error::ConfigError;
use crate::math::{shortest_rotation, wrap_angle};

/// Exponential approach of joint angles toward a goal.
///
/// Every step moves each angle a fixed fraction of its remaining shortest
/// rotation, optionally capped by a maximum step. Once every angle is within
/// epsilon of its goal the angles snap onto the goal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interpolator {
    /// Smoothing factor.
    fraction: f64,
    /// Snap distance in radians.
    epsilon: f64,
    /// Largest angular step per frame in radians.
    max_step: Option<f64>,
}

impl Default for Interpolator {
    fn default() -> Self {
        Self {
            fraction: 0.08,
            epsilon: 1e-3,
            max_step: None,
        }
    }
}

impl Interpolator {
    /// Construct the interpolator.
    ///
    /// The fraction must lie in `(0, 1]`, epsilon and the optional step cap
    /// must be positive.
    pub fn new(fraction: f64, epsilon: f64, max_step: Option<f64>) -> Result<Self, ConfigError> {
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(ConfigError::Interpolation(format!(
                "fraction {} outside (0, 1]",
                fraction
            )));
        }
        if !(epsilon > 0.0 && epsilon.is_finite()) {
            return Err(ConfigError::Interpolation(format!(
                "epsilon {} must be positive",
                epsilon
            )));
        }
        if let Some(step) = max_step {
            if !(step > 0.0) {
                return Err(ConfigError::Interpolation(format!(
                    "max step {} must be positive",
                    step
                )));
            }
        }

        Ok(Self {
            fraction,
            epsilon,
            max_step,
        })
    }

    #[inline]
    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    #[inline]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    #[inline]
    pub fn max_step(&self) -> Option<f64> {
        self.max_step
    }

    /// Whether every angle is within epsilon of its goal.
    pub fn settled(&self, current: &[f64], goal: &[f64]) -> bool {
        current
            .iter()
            .zip(goal)
            .all(|(angle, target)| shortest_rotation(target - angle).abs() < self.epsilon)
    }

    /// Advance `current` one step toward `goal`.
    ///
    /// Returns true once the angles have arrived, in which case `current`
    /// holds exactly the goal.
    pub fn step(&self, current: &mut [f64], goal: &[f64]) -> bool {
        debug_assert_eq!(current.len(), goal.len());

        for (angle, target) in current.iter_mut().zip(goal) {
            let delta = shortest_rotation(target - *angle);

            let mut step = delta * self.fraction;
            if let Some(max_step) = self.max_step {
                step = step.clamp(-max_step, max_step);
            }

            *angle = wrap_angle(*angle + step);
        }

        if self.settled(current, goal) {
            current.copy_from_slice(goal);
            return true;
        }

        false
    }
}
