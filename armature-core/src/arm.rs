// Copyright (C) 2024 Laixer Equipment B.V.
// All rights reserved.
//
// This software may be modified and distributed under the terms
// of the included license.  See the LICENSE file for details.

use nalgebra::Point2;

use crate::algorithm::ik::{Elbow, GeometricSolver, NumericSolver, PointingSolver, Solver};
use crate::algorithm::interpolate::Interpolator;
use crate::algorithm::root::RootConfig;
use crate::chain::LinkChain;
use crate::engine::Engine;
use crate::error::ConfigError;
use crate::target::{AnimateToClick, FollowPointer};

/// Engine parameters shared by all arm configurations.
#[derive(Clone, Copy, Debug)]
pub struct EngineSettings {
    /// Base joint position.
    pub origin: Point2<f64>,
    /// Animation parameters for click driven arms.
    pub interpolator: Interpolator,
    /// Numerical solver parameters.
    pub solver: RootConfig,
    /// Minimum distance between consecutive click targets.
    pub click_threshold: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            origin: Point2::origin(),
            interpolator: Interpolator::default(),
            solver: RootConfig::default(),
            click_threshold: AnimateToClick::DEFAULT_THRESHOLD,
        }
    }
}

/// Predefined arm configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArmKind {
    /// Three links animating toward clicks.
    Animated3Link,
    /// Single link pointing at the cursor.
    Mouse1Link,
    /// Two links following the cursor, numerical solver.
    Mouse2LinkFsolve,
    /// Two links following the cursor, closed form solver.
    Mouse2LinkGeometric,
    /// Three links following the cursor.
    Mouse3Link,
}

impl ArmKind {
    /// Every configuration name, in declaration order.
    pub const NAMES: [&'static str; 5] = [
        "animated_3link",
        "mouse_1link",
        "mouse_2link_fsolve",
        "mouse_2link_geometric",
        "mouse_3link",
    ];

    pub const ALL: [ArmKind; 5] = [
        ArmKind::Animated3Link,
        ArmKind::Mouse1Link,
        ArmKind::Mouse2LinkFsolve,
        ArmKind::Mouse2LinkGeometric,
        ArmKind::Mouse3Link,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ArmKind::Animated3Link => Self::NAMES[0],
            ArmKind::Mouse1Link => Self::NAMES[1],
            ArmKind::Mouse2LinkFsolve => Self::NAMES[2],
            ArmKind::Mouse2LinkGeometric => Self::NAMES[3],
            ArmKind::Mouse3Link => Self::NAMES[4],
        }
    }

    /// Number of links the configuration drives.
    pub fn link_count(&self) -> usize {
        self.default_links().len()
    }

    /// Link lengths used when none are supplied.
    pub fn default_links(&self) -> &'static [f64] {
        match self {
            ArmKind::Animated3Link | ArmKind::Mouse3Link => &[100.0, 70.0, 50.0],
            ArmKind::Mouse1Link => &[150.0],
            ArmKind::Mouse2LinkFsolve | ArmKind::Mouse2LinkGeometric => &[100.0, 100.0],
        }
    }

    /// Whether the arm animates toward clicks instead of following the pointer.
    pub fn is_animated(&self) -> bool {
        matches!(self, ArmKind::Animated3Link)
    }

    fn solver(&self, config: RootConfig) -> Box<dyn Solver> {
        match self {
            ArmKind::Mouse1Link => Box::new(PointingSolver),
            ArmKind::Mouse2LinkGeometric => Box::new(GeometricSolver::new(Elbow::Down)),
            ArmKind::Mouse2LinkFsolve => Box::new(NumericSolver::with_config(2, config)),
            ArmKind::Animated3Link | ArmKind::Mouse3Link => {
                Box::new(NumericSolver::with_config(3, config))
            }
        }
    }

    /// Validate the link lengths.
    ///
    /// An empty slice selects the default lengths.
    pub fn chain(&self, links: &[f64]) -> Result<LinkChain, ConfigError> {
        if links.is_empty() {
            return LinkChain::new(self.default_links());
        }

        if links.len() != self.link_count() {
            return Err(ConfigError::LinkCount {
                expected: self.link_count(),
                actual: links.len(),
            });
        }

        LinkChain::new(links)
    }

    /// Construct the engine for this configuration.
    pub fn engine(&self, links: &[f64], settings: &EngineSettings) -> Result<Engine, ConfigError> {
        let chain = self.chain(links)?;

        let builder = Engine::builder(chain, self.solver(settings.solver))
            .origin(settings.origin)
            .interpolator(settings.interpolator);

        if self.is_animated() {
            builder
                .strategy(AnimateToClick::new(settings.click_threshold))
                .build()
        } else {
            builder.strategy(FollowPointer).build()
        }
    }
}

impl std::str::FromStr for ArmKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArmKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ConfigError::UnknownArm(s.to_owned()))
    }
}

impl std::fmt::Display for ArmKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
