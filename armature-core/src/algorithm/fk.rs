// Copyright (C) 2024 Laixer Equipment B.V.
// All rights reserved.
//
// This software may be modified and distributed under the terms
// of the included license.  See the LICENSE file for details.

use nalgebra::{Matrix2xX, Point2, Vector2};

use crate::chain::{JointAngles, JointPositions, LinkChain};

/// Planar serial-chain forward kinematics.
///
/// Joint `i + 1` is joint `i` displaced by a vector of length `chain[i]`
/// oriented at the cumulative angle of links `0..=i`. The result holds
/// `chain.len() + 1` points, origin first and end-effector last.
pub fn forward(origin: &Point2<f64>, chain: &LinkChain, angles: &JointAngles) -> JointPositions {
    debug_assert_eq!(chain.len(), angles.len());

    let mut positions = Vec::with_capacity(chain.len() + 1);
    positions.push(*origin);

    let mut joint = *origin;
    for (length, phi) in chain.lengths().iter().zip(angles.cumulative()) {
        joint += Vector2::new(length * phi.cos(), length * phi.sin());
        positions.push(joint);
    }

    positions
}

/// End-effector position of the chain.
pub fn end_effector(origin: &Point2<f64>, lengths: &[f64], angles: &[f64]) -> Point2<f64> {
    let mut phi = 0.0;

    lengths
        .iter()
        .zip(angles)
        .fold(*origin, |point, (length, angle)| {
            phi += angle;
            point + Vector2::new(length * phi.cos(), length * phi.sin())
        })
}

/// Jacobian of the end-effector position with respect to the joint angles.
///
/// Column `i` is the velocity of the end-effector for a unit rotation of
/// joint `i`, the sum over all distal links `k >= i` of
/// `L_k * (-sin phi_k, cos phi_k)`.
pub fn jacobian(lengths: &[f64], angles: &[f64]) -> Matrix2xX<f64> {
    let n = lengths.len();
    let mut jacobian = Matrix2xX::zeros(n);

    let mut phi = 0.0;
    let link_velocity = lengths
        .iter()
        .zip(angles)
        .map(|(length, angle)| {
            phi += angle;
            Vector2::new(-length * phi.sin(), length * phi.cos())
        })
        .collect::<Vec<_>>();

    let mut distal = Vector2::zeros();
    for i in (0..n).rev() {
        distal += link_velocity[i];
        jacobian.set_column(i, &distal);
    }

    jacobian
}

/// Forward kinematics bound to a fixed chain and origin.
pub struct ForwardKinematics<'a> {
    origin: Point2<f64>,
    chain: &'a LinkChain,
}

impl<'a> ForwardKinematics<'a> {
    pub fn new(origin: Point2<f64>, chain: &'a LinkChain) -> Self {
        Self { origin, chain }
    }

    pub fn solve(&self, angles: &JointAngles) -> JointPositions {
        forward(&self.origin, self.chain, angles)
    }

    pub fn end_effector(&self, angles: &[f64]) -> Point2<f64> {
        end_effector(&self.origin, self.chain.lengths(), angles)
    }
}
