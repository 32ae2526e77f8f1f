// Copyright (C) 2024 Laixer Equipment B.V.
// All rights reserved.
//
// This software may be modified and distributed under the terms
// of the included license.  See the LICENSE file for details.

use std::{error, fmt};

/// Startup configuration error.
///
/// These are fatal. They are reported before any simulation state is
/// constructed, the frame loop never starts.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Number of link lengths does not match the arm configuration.
    LinkCount { expected: usize, actual: usize },
    /// Chain has no links or more links than supported.
    ChainSize(usize),
    /// Link length is zero, negative or not a number.
    LinkLength { index: usize, length: f64 },
    /// Solver operates on a different number of links than the chain.
    SolverMismatch { solver: usize, chain: usize },
    /// Interpolation fraction outside `(0, 1]` or non-positive epsilon.
    Interpolation(String),
    /// Numerical solver tolerance is not positive.
    SolverTolerance(f64),
    /// Unknown arm configuration name.
    UnknownArm(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::LinkCount { expected, actual } => write!(
                f,
                "arm requires exactly {} link length(s), {} given",
                expected, actual
            ),
            ConfigError::ChainSize(size) => write!(
                f,
                "link chain must have between 1 and {} links, {} given",
                crate::chain::MAX_LINKS,
                size
            ),
            ConfigError::LinkLength { index, length } => write!(
                f,
                "link {} has invalid length {}, lengths must be positive",
                index + 1,
                length
            ),
            ConfigError::SolverMismatch { solver, chain } => write!(
                f,
                "solver expects {} link(s) but chain has {}",
                solver, chain
            ),
            ConfigError::Interpolation(reason) => write!(f, "invalid interpolation: {}", reason),
            ConfigError::SolverTolerance(tolerance) => {
                write!(f, "solver tolerance {} must be positive", tolerance)
            }
            ConfigError::UnknownArm(name) => write!(
                f,
                "unknown arm type '{}', available: {}",
                name,
                crate::arm::ArmKind::NAMES.join(", ")
            ),
        }
    }
}

impl error::Error for ConfigError {}

/// Per-frame solver failure.
///
/// The engine recovers from these locally by holding the last valid pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolveError {
    /// Target lies outside the reachable annulus of the chain.
    Unreachable {
        distance: f64,
        min_reach: f64,
        max_reach: f64,
    },
    /// Numerical solver exhausted its iteration budget.
    NotConverged { residual: f64, iterations: u32 },
    /// Solver was handed a chain with the wrong number of links.
    LinkCount { expected: usize, actual: usize },
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveError::Unreachable {
                distance,
                min_reach,
                max_reach,
            } => write!(
                f,
                "target at distance {:.3} is outside reach [{:.3}, {:.3}]",
                distance, min_reach, max_reach
            ),
            SolveError::NotConverged {
                residual,
                iterations,
            } => write!(
                f,
                "solver did not converge after {} iterations (residual {:.3e})",
                iterations, residual
            ),
            SolveError::LinkCount { expected, actual } => write!(
                f,
                "solver expects {} link(s), chain has {}",
                expected, actual
            ),
        }
    }
}

impl error::Error for SolveError {}
