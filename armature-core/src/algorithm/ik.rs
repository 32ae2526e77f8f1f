// Copyright (C) 2024 Laixer Equipment B.V.
// All rights reserved.
//
// This software may be modified and distributed under the terms
// of the included license.  See the LICENSE file for details.

use std::f64::consts::PI;

use nalgebra::{DMatrix, DVector, Point2};

use super::fk;
use super::root::{find_root, Residual, RootConfig};
use crate::chain::{JointAngles, LinkChain};
use crate::error::SolveError;
use crate::math::{law_of_cosines, wrap_angle};

/// Bend applied to a seed that sits exactly on a straight or folded singularity.
const SEED_BEND: f64 = 0.1;
/// Relative tolerance on the reachable annulus of the geometric solver.
const BOUNDARY_SLACK: f64 = 1e-9;

/// Elbow convention of the two-link geometric solver.
///
/// Most reachable targets admit two solutions that mirror the elbow across
/// the line from the origin to the target. The convention is fixed per solver
/// so the elbow never flips between frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Elbow {
    /// Positive relative angle of the second link. In a y-up frame the second
    /// link turns counter-clockwise from the first and the elbow sits below
    /// the origin-target line. On a y-down screen the elbow appears above it.
    #[default]
    Down,
    /// Negative relative angle of the second link, the mirror of [`Elbow::Down`].
    Up,
}

impl Elbow {
    #[inline]
    fn sign(&self) -> f64 {
        match self {
            Elbow::Down => 1.0,
            Elbow::Up => -1.0,
        }
    }
}

/// One-link pointing solver.
///
/// Returns the bearing from the origin to the target. Always succeeds, the
/// end-effector lands on the circle of radius `link_length` along that
/// bearing, not necessarily on the target.
pub fn solve_1link(origin: &Point2<f64>, link_length: f64, target: &Point2<f64>) -> f64 {
    let delta = target - origin;

    if delta.norm() > link_length {
        log::trace!(
            "Target ({:.2}, {:.2}) beyond link length {:.2}",
            target.x,
            target.y,
            link_length
        );
    }

    delta.y.atan2(delta.x)
}

/// Two-link geometric solver using the elbow-down convention.
///
/// See [`solve_2link_geometric_with`].
pub fn solve_2link_geometric(
    origin: &Point2<f64>,
    lengths: [f64; 2],
    target: &Point2<f64>,
) -> Result<[f64; 2], SolveError> {
    solve_2link_geometric_with(origin, lengths, target, Elbow::Down)
}

/// Two-link geometric solver based on the law of cosines.
///
/// Fails with [`SolveError::Unreachable`] when the target lies outside the
/// annulus `|L1 - L2| <= d <= L1 + L2`. Targets on either boundary are
/// solved up to a relative slack of `1e-9`, the cosine is clamped to
/// `[-1, 1]` to absorb the rounding.
pub fn solve_2link_geometric_with(
    origin: &Point2<f64>,
    lengths: [f64; 2],
    target: &Point2<f64>,
    elbow: Elbow,
) -> Result<[f64; 2], SolveError> {
    let [l1, l2] = lengths;
    let delta = target - origin;
    let distance = delta.norm();

    let max_reach = l1 + l2;
    let min_reach = (l1 - l2).abs();

    // Targets constructed on the boundary land an ulp outside of it.
    let slack = BOUNDARY_SLACK * max_reach;

    if distance > max_reach + slack || distance < min_reach - slack || !distance.is_finite() {
        return Err(SolveError::Unreachable {
            distance,
            min_reach,
            max_reach,
        });
    }

    // Relative angle is the supplement of the interior elbow angle.
    let theta_2 = elbow.sign() * (PI - law_of_cosines(l1, l2, distance));

    let theta_1 =
        delta.y.atan2(delta.x) - (l2 * theta_2.sin()).atan2(l1 + l2 * theta_2.cos());

    Ok([wrap_angle(theta_1), wrap_angle(theta_2)])
}

/// Both two-link geometric solutions, elbow-down first.
pub fn solve_2link_geometric_pair(
    origin: &Point2<f64>,
    lengths: [f64; 2],
    target: &Point2<f64>,
) -> Result<([f64; 2], [f64; 2]), SolveError> {
    Ok((
        solve_2link_geometric_with(origin, lengths, target, Elbow::Down)?,
        solve_2link_geometric_with(origin, lengths, target, Elbow::Up)?,
    ))
}

/// Two-link numerical solver seeded with `initial_guess`.
pub fn solve_2link_numeric(
    origin: &Point2<f64>,
    lengths: [f64; 2],
    target: &Point2<f64>,
    initial_guess: [f64; 2],
) -> Result<[f64; 2], SolveError> {
    let angles = solve_numeric(origin, &lengths, target, &initial_guess, &RootConfig::default())?;

    Ok([angles[0], angles[1]])
}

/// Three-link numerical solver seeded with `initial_guess`.
///
/// The chain is redundant, every reachable target has infinitely many exact
/// solutions. The damped least-squares iteration takes minimum-norm steps and
/// settles on the solution nearest the seed.
pub fn solve_3link(
    origin: &Point2<f64>,
    lengths: [f64; 3],
    target: &Point2<f64>,
    initial_guess: [f64; 3],
) -> Result<[f64; 3], SolveError> {
    let angles = solve_numeric(origin, &lengths, target, &initial_guess, &RootConfig::default())?;

    Ok([angles[0], angles[1], angles[2]])
}

/// End-effector residual of a planar chain.
struct ChainResidual<'a> {
    origin: &'a Point2<f64>,
    lengths: &'a [f64],
    target: &'a Point2<f64>,
}

impl Residual for ChainResidual<'_> {
    fn residual(&self, x: &DVector<f64>) -> DVector<f64> {
        let effector = fk::end_effector(self.origin, self.lengths, x.as_slice());

        DVector::from_column_slice(&[effector.x - self.target.x, effector.y - self.target.y])
    }

    fn jacobian(&self, x: &DVector<f64>) -> DMatrix<f64> {
        let jacobian = fk::jacobian(self.lengths, x.as_slice());

        DMatrix::from_column_slice(2, self.lengths.len(), jacobian.as_slice())
    }
}

/// Numerical inverse kinematics for chains of any length.
///
/// Drives `forward(origin, lengths, theta) - target` to zero with the damped
/// least-squares root finder. Fails with [`SolveError::NotConverged`] when the
/// residual norm is still above the tolerance after the iteration budget,
/// which is what happens for unreachable targets.
pub fn solve_numeric(
    origin: &Point2<f64>,
    lengths: &[f64],
    target: &Point2<f64>,
    initial_guess: &[f64],
    config: &RootConfig,
) -> Result<Vec<f64>, SolveError> {
    debug_assert_eq!(lengths.len(), initial_guess.len());

    let mut seed = DVector::from_column_slice(initial_guess);

    // A straight or folded chain has a rank deficient Jacobian and a target on
    // its line yields a zero gradient. Bend the distal joints off the
    // singularity, the sign follows the elbow-down convention.
    if seed.len() > 1 && seed.iter().skip(1).all(|angle| angle.sin().abs() < 1e-9) {
        for angle in seed.iter_mut().skip(1) {
            *angle += SEED_BEND;
        }
    }

    let problem = ChainResidual {
        origin,
        lengths,
        target,
    };

    let root = find_root(&problem, seed, config);

    if !root.converged {
        return Err(SolveError::NotConverged {
            residual: root.residual,
            iterations: root.iterations,
        });
    }

    Ok(root.x.iter().map(|angle| wrap_angle(*angle)).collect())
}

/// Inverse kinematics strategy injected into the engine.
pub trait Solver {
    /// Short descriptive name.
    fn name(&self) -> &'static str;

    /// Number of links the solver operates on.
    fn links(&self) -> usize;

    /// Solve joint angles placing the end-effector at `target`.
    ///
    /// `seed` holds the current joint angles. Stateless solvers ignore it.
    fn solve(
        &self,
        origin: &Point2<f64>,
        chain: &LinkChain,
        target: &Point2<f64>,
        seed: &JointAngles,
    ) -> Result<JointAngles, SolveError>;
}

impl<S: Solver + ?Sized> Solver for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn links(&self) -> usize {
        (**self).links()
    }

    fn solve(
        &self,
        origin: &Point2<f64>,
        chain: &LinkChain,
        target: &Point2<f64>,
        seed: &JointAngles,
    ) -> Result<JointAngles, SolveError> {
        (**self).solve(origin, chain, target, seed)
    }
}

fn check_links(expected: usize, chain: &LinkChain) -> Result<(), SolveError> {
    if chain.len() != expected {
        return Err(SolveError::LinkCount {
            expected,
            actual: chain.len(),
        });
    }

    Ok(())
}

/// Closed form one-link pointing solver.
#[derive(Clone, Copy, Debug, Default)]
pub struct PointingSolver;

impl Solver for PointingSolver {
    fn name(&self) -> &'static str {
        "pointing"
    }

    fn links(&self) -> usize {
        1
    }

    fn solve(
        &self,
        origin: &Point2<f64>,
        chain: &LinkChain,
        target: &Point2<f64>,
        _seed: &JointAngles,
    ) -> Result<JointAngles, SolveError> {
        check_links(self.links(), chain)?;

        Ok(JointAngles::from([solve_1link(origin, chain[0], target)]))
    }
}

/// Closed form two-link solver with a fixed elbow convention.
#[derive(Clone, Copy, Debug, Default)]
pub struct GeometricSolver {
    elbow: Elbow,
}

impl GeometricSolver {
    pub fn new(elbow: Elbow) -> Self {
        Self { elbow }
    }
}

impl Solver for GeometricSolver {
    fn name(&self) -> &'static str {
        "geometric"
    }

    fn links(&self) -> usize {
        2
    }

    fn solve(
        &self,
        origin: &Point2<f64>,
        chain: &LinkChain,
        target: &Point2<f64>,
        _seed: &JointAngles,
    ) -> Result<JointAngles, SolveError> {
        check_links(self.links(), chain)?;

        solve_2link_geometric_with(origin, [chain[0], chain[1]], target, self.elbow)
            .map(JointAngles::from)
    }
}

/// Seeded numerical solver for two or three links.
#[derive(Clone, Copy, Debug)]
pub struct NumericSolver {
    links: usize,
    config: RootConfig,
}

impl NumericSolver {
    pub fn new(links: usize) -> Self {
        Self::with_config(links, RootConfig::default())
    }

    pub fn with_config(links: usize, config: RootConfig) -> Self {
        Self { links, config }
    }
}

impl Solver for NumericSolver {
    fn name(&self) -> &'static str {
        "numeric"
    }

    fn links(&self) -> usize {
        self.links
    }

    fn solve(
        &self,
        origin: &Point2<f64>,
        chain: &LinkChain,
        target: &Point2<f64>,
        seed: &JointAngles,
    ) -> Result<JointAngles, SolveError> {
        check_links(self.links(), chain)?;
        check_links(seed.len(), chain)?;

        solve_numeric(origin, chain.lengths(), target, seed, &self.config).map(JointAngles::from)
    }
}
