// Copyright (C) 2024 Laixer Equipment B.V.
// All rights reserved.
//
// This software may be modified and distributed under the terms
// of the included license.  See the LICENSE file for details.

use nalgebra::Point2;

use crate::error::ConfigError;

/// Maximum number of links in a chain.
pub const MAX_LINKS: usize = 3;

/// Ordered joint positions, origin through end-effector.
pub type JointPositions = Vec<Point2<f64>>;

/// Ordered sequence of rigid link lengths.
///
/// The chain is validated on construction: it holds between one and
/// [`MAX_LINKS`] links and every length is finite and positive.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkChain(Vec<f64>);

impl LinkChain {
    /// Construct a new link chain.
    pub fn new(lengths: impl Into<Vec<f64>>) -> Result<Self, ConfigError> {
        let lengths = lengths.into();

        if lengths.is_empty() || lengths.len() > MAX_LINKS {
            return Err(ConfigError::ChainSize(lengths.len()));
        }

        if let Some((index, length)) = lengths
            .iter()
            .enumerate()
            .find(|(_, length)| !length.is_finite() || **length <= 0.0)
        {
            return Err(ConfigError::LinkLength {
                index,
                length: *length,
            });
        }

        Ok(Self(lengths))
    }

    /// Number of links.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// A valid chain is never empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn lengths(&self) -> &[f64] {
        &self.0
    }

    /// Maximum distance from the origin the end-effector can reach.
    pub fn reach(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Minimum distance from the origin the end-effector can reach.
    ///
    /// Non-zero only when one link is longer than all others combined.
    pub fn min_reach(&self) -> f64 {
        let longest = self.0.iter().copied().fold(0.0, f64::max);

        (2.0 * longest - self.reach()).max(0.0)
    }
}

impl std::ops::Index<usize> for LinkChain {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl std::fmt::Display for LinkChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lengths = self
            .0
            .iter()
            .map(|length| format!("{:.1}", length))
            .collect::<Vec<_>>();

        write!(f, "[{}]", lengths.join(", "))
    }
}

/// Joint angles in radians, one per link.
///
/// Angle `i` is relative to the orientation of link `i - 1`, the first angle
/// is relative to the positive x-axis.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JointAngles(Vec<f64>);

impl JointAngles {
    /// All joints at zero, the chain fully stretched along the x-axis.
    pub fn zeros(links: usize) -> Self {
        Self(vec![0.0; links])
    }

    /// Absolute orientation of every link.
    pub fn cumulative(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().scan(0.0, |phi, angle| {
            *phi += angle;
            Some(*phi)
        })
    }

    /// Angles in degrees.
    pub fn to_degrees(&self) -> Vec<f64> {
        self.0.iter().map(|angle| angle.to_degrees()).collect()
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.0
    }
}

impl From<Vec<f64>> for JointAngles {
    fn from(value: Vec<f64>) -> Self {
        Self(value)
    }
}

impl<const N: usize> From<[f64; N]> for JointAngles {
    fn from(value: [f64; N]) -> Self {
        Self(value.to_vec())
    }
}

impl std::ops::Deref for JointAngles {
    type Target = [f64];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for JointAngles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (idx, angle) in self.0.iter().enumerate() {
            if idx > 0 {
                write!(f, " ")?;
            }
            write!(f, "θ{}={:5.2}rad/{:7.2}°", idx + 1, angle, angle.to_degrees())?;
        }

        Ok(())
    }
}
