// Copyright (C) 2024 Laixer Equipment B.V.
// All rights reserved.
//
// This software may be modified and distributed under the terms
// of the included license.  See the LICENSE file for details.

//! Planar arm kinematics.
//!
//! Forward kinematics and inverse kinematics solvers for serial chains of one
//! to three links, and the simulation engine driving an arm toward pointer
//! or click targets.

pub mod algorithm;
pub mod arm;
pub mod chain;
pub mod engine;
pub mod error;
pub mod io;
pub mod math;
pub mod target;

pub use nalgebra;

pub use arm::{ArmKind, EngineSettings};
pub use chain::{JointAngles, JointPositions, LinkChain};
pub use engine::{Engine, EngineBuilder, EngineState};
pub use error::{ConfigError, SolveError};
pub use io::{Frame, Input, InputEvent, Renderer};
