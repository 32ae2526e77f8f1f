// Copyright (C) 2024 Laixer Equipment B.V.
// All rights reserved.
//
// This software may be modified and distributed under the terms
// of the included license.  See the LICENSE file for details.

use nalgebra::Point2;

use crate::algorithm::fk;
use crate::algorithm::ik::Solver;
use crate::algorithm::interpolate::Interpolator;
use crate::chain::{JointAngles, JointPositions, LinkChain};
use crate::error::{ConfigError, SolveError};
use crate::io::{Frame, Input, InputEvent, Renderer};
use crate::target::{Acquisition, FollowPointer, TargetStrategy};

/// Engine state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    /// Solving for the pointer every frame.
    Tracking,
    /// Holding the pose, waiting for a click.
    Idle,
    /// Interpolating toward the goal angles of the last click.
    Animating,
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EngineState::Tracking => "tracking",
            EngineState::Idle => "idle",
            EngineState::Animating => "animating",
        };

        f.pad(name)
    }
}

pub struct EngineBuilder {
    origin: Point2<f64>,
    chain: LinkChain,
    solver: Box<dyn Solver>,
    strategy: Box<dyn TargetStrategy>,
    interpolator: Interpolator,
    angles: Option<JointAngles>,
}

impl EngineBuilder {
    /// Position of the base joint.
    pub fn origin(mut self, origin: Point2<f64>) -> Self {
        self.origin = origin;
        self
    }

    pub fn strategy(mut self, strategy: impl TargetStrategy + 'static) -> Self {
        self.strategy = Box::new(strategy);
        self
    }

    pub fn interpolator(mut self, interpolator: Interpolator) -> Self {
        self.interpolator = interpolator;
        self
    }

    /// Initial joint angles, defaults to a stretched chain.
    pub fn angles(mut self, angles: impl Into<JointAngles>) -> Self {
        self.angles = Some(angles.into());
        self
    }

    /// Build the engine from its properties.
    ///
    /// This call consumes the builder.
    pub fn build(self) -> Result<Engine, ConfigError> {
        if self.solver.links() != self.chain.len() {
            return Err(ConfigError::SolverMismatch {
                solver: self.solver.links(),
                chain: self.chain.len(),
            });
        }

        let angles = match self.angles {
            Some(angles) if angles.len() != self.chain.len() => {
                return Err(ConfigError::LinkCount {
                    expected: self.chain.len(),
                    actual: angles.len(),
                });
            }
            Some(angles) => angles,
            None => JointAngles::zeros(self.chain.len()),
        };

        let state = match self.strategy.acquisition() {
            Acquisition::Continuous => EngineState::Tracking,
            Acquisition::Discrete => EngineState::Idle,
        };

        log::debug!(
            "Engine with {} solver on chain {} at ({:.1}, {:.1})",
            self.solver.name(),
            self.chain,
            self.origin.x,
            self.origin.y
        );

        Ok(Engine {
            origin: self.origin,
            chain: self.chain,
            angles,
            solver: self.solver,
            strategy: self.strategy,
            interpolator: self.interpolator,
            state,
            goal: None,
            target: None,
            frame: 0,
            failing: false,
        })
    }
}

/// Planar arm simulation engine.
///
/// The engine owns the chain and the joint angles. Every tick acquires a
/// target from the input, solves for it and hands the resulting pose to the
/// renderer. Solver failures never escape a tick, the arm holds its last
/// valid pose instead.
pub struct Engine {
    origin: Point2<f64>,
    chain: LinkChain,
    angles: JointAngles,
    solver: Box<dyn Solver>,
    strategy: Box<dyn TargetStrategy>,
    interpolator: Interpolator,
    state: EngineState,
    /// Goal angles while animating.
    goal: Option<JointAngles>,
    /// Last accepted target.
    target: Option<Point2<f64>>,
    frame: u64,
    /// Whether the last solve failed.
    failing: bool,
}

impl Engine {
    /// Start building an engine for `chain` driven by `solver`.
    ///
    /// The engine follows the pointer unless another strategy is set.
    pub fn builder(chain: LinkChain, solver: impl Solver + 'static) -> EngineBuilder {
        EngineBuilder {
            origin: Point2::origin(),
            chain,
            solver: Box::new(solver),
            strategy: Box::new(FollowPointer),
            interpolator: Interpolator::default(),
            angles: None,
        }
    }

    #[inline]
    pub fn state(&self) -> EngineState {
        self.state
    }

    #[inline]
    pub fn origin(&self) -> &Point2<f64> {
        &self.origin
    }

    #[inline]
    pub fn chain(&self) -> &LinkChain {
        &self.chain
    }

    #[inline]
    pub fn angles(&self) -> &JointAngles {
        &self.angles
    }

    #[inline]
    pub fn target(&self) -> Option<&Point2<f64>> {
        self.target.as_ref()
    }

    /// Number of frames simulated so far.
    #[inline]
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    #[inline]
    pub fn solver_name(&self) -> &'static str {
        self.solver.name()
    }

    /// Joint positions of the current pose.
    pub fn positions(&self) -> JointPositions {
        fk::forward(&self.origin, &self.chain, &self.angles)
    }

    fn solve(&mut self, target: &Point2<f64>) -> Option<JointAngles> {
        match self
            .solver
            .solve(&self.origin, &self.chain, target, &self.angles)
        {
            Ok(angles) => {
                if self.failing {
                    log::debug!("Solver recovered");
                    self.failing = false;
                }
                Some(angles)
            }
            Err(e) => {
                self.report(target, e);
                None
            }
        }
    }

    fn report(&mut self, target: &Point2<f64>, error: SolveError) {
        if self.failing {
            log::trace!(
                "No solution for ({:.1}, {:.1}): {}",
                target.x,
                target.y,
                error
            );
        } else {
            log::warn!(
                "No solution for ({:.1}, {:.1}): {}; holding pose",
                target.x,
                target.y,
                error
            );
            self.failing = true;
        }
    }

    /// Advance the simulation by one frame.
    pub fn tick(&mut self, event: &InputEvent) -> Frame {
        let acquired = self.strategy.acquire(event, self.target.as_ref());

        match self.strategy.acquisition() {
            Acquisition::Continuous => {
                if let Some(target) = acquired {
                    self.target = Some(target);
                    if let Some(angles) = self.solve(&target) {
                        self.angles = angles;
                    }
                }
            }
            Acquisition::Discrete => {
                if let Some(target) = acquired {
                    if let Some(goal) = self.solve(&target) {
                        if self.state == EngineState::Animating {
                            log::debug!("Retarget to ({:.1}, {:.1})", target.x, target.y);
                        } else {
                            log::debug!("Animate to ({:.1}, {:.1})", target.x, target.y);
                        }

                        self.target = Some(target);
                        self.goal = Some(goal);
                        self.state = EngineState::Animating;
                    }
                }

                if self.state == EngineState::Animating {
                    let arrived = match &self.goal {
                        Some(goal) => self.interpolator.step(self.angles.as_mut_slice(), goal),
                        None => true,
                    };

                    if arrived {
                        log::debug!("Arrived at goal: {}", self.angles);
                        self.goal = None;
                        self.state = EngineState::Idle;
                    }
                }
            }
        }

        let frame = Frame {
            index: self.frame,
            state: self.state,
            positions: self.positions(),
            angles: self.angles.clone(),
            target: self.target,
        };

        self.frame += 1;

        frame
    }

    /// Run the simulation until the input signals quit.
    ///
    /// Returns the number of frames rendered.
    pub fn run<I: Input + ?Sized, R: Renderer + ?Sized>(
        &mut self,
        input: &mut I,
        renderer: &mut R,
    ) -> u64 {
        let start = self.frame;

        while let Some(event) = input.poll() {
            renderer.render(self.tick(&event));
        }

        log::debug!("Input exhausted after {} frames", self.frame - start);

        self.frame - start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::ik::{Elbow, GeometricSolver, NumericSolver, PointingSolver};
    use crate::io::{FrameCollector, ReplayInput};
    use crate::target::AnimateToClick;

    fn assert_reaches(frame: &Frame, target: &Point2<f64>) {
        let error = (frame.end_effector().unwrap() - target).norm();

        assert!(error <= 1e-6 + 1e-9, "end-effector off by {:.3e}", error);
    }

    fn animated_engine() -> Engine {
        Engine::builder(
            LinkChain::new([100.0, 70.0, 50.0]).unwrap(),
            NumericSolver::new(3),
        )
        .strategy(AnimateToClick::default())
        .build()
        .unwrap()
    }

    #[test]
    fn test_builder_solver_mismatch() {
        let result = Engine::builder(
            LinkChain::new([100.0, 70.0, 50.0]).unwrap(),
            GeometricSolver::default(),
        )
        .build();

        assert!(matches!(
            result,
            Err(ConfigError::SolverMismatch {
                solver: 2,
                chain: 3
            })
        ));
    }

    #[test]
    fn test_builder_angle_mismatch() {
        let result = Engine::builder(LinkChain::new([150.0]).unwrap(), PointingSolver)
            .angles([0.0, 0.0])
            .build();

        assert!(matches!(result, Err(ConfigError::LinkCount { .. })));
    }

    #[test]
    fn test_initial_state() {
        let engine = Engine::builder(LinkChain::new([150.0]).unwrap(), PointingSolver)
            .origin(Point2::new(400.0, 300.0))
            .build()
            .unwrap();

        assert_eq!(engine.state(), EngineState::Tracking);
        assert_eq!(engine.positions()[1], Point2::new(550.0, 300.0));

        assert_eq!(animated_engine().state(), EngineState::Idle);
    }

    #[test]
    fn test_tracking() {
        let mut engine = Engine::builder(
            LinkChain::new([100.0, 100.0]).unwrap(),
            GeometricSolver::new(Elbow::Down),
        )
        .build()
        .unwrap();

        let target = Point2::new(150.0, 0.0);
        let frame = engine.tick(&InputEvent::pointer(target));

        assert_eq!(frame.index, 0);
        assert_eq!(frame.state, EngineState::Tracking);
        assert_eq!(frame.positions.len(), 3);
        assert_eq!(frame.target, Some(target));
        assert!((frame.end_effector().unwrap() - target).norm() < 1e-6);
    }

    #[test]
    fn test_unreachable_holds_pose() {
        let mut engine = Engine::builder(
            LinkChain::new([100.0, 100.0]).unwrap(),
            GeometricSolver::new(Elbow::Down),
        )
        .build()
        .unwrap();

        engine.tick(&InputEvent::pointer(Point2::new(100.0, 100.0)));
        let pose = engine.angles().clone();

        for _ in 0..3 {
            let frame = engine.tick(&InputEvent::pointer(Point2::new(250.0, 0.0)));

            assert_eq!(frame.angles, pose);
            assert_eq!(frame.state, EngineState::Tracking);
        }

        let target = Point2::new(0.0, 120.0);
        let frame = engine.tick(&InputEvent::pointer(target));
        assert!((frame.end_effector().unwrap() - target).norm() < 1e-6);
    }

    #[test]
    fn test_numeric_tracking_from_stretched() {
        let mut engine = Engine::builder(
            LinkChain::new([100.0, 70.0, 50.0]).unwrap(),
            NumericSolver::new(3),
        )
        .build()
        .unwrap();

        let target = Point2::new(160.0, 0.0);
        let frame = engine.tick(&InputEvent::pointer(target));

        assert_reaches(&frame, &target);
    }

    #[test]
    fn test_animation_cycle() {
        let mut engine = animated_engine();
        let target = Point2::new(100.0, 100.0);

        let frame = engine.tick(&InputEvent::click(target));
        assert_eq!(frame.state, EngineState::Animating);
        assert_eq!(frame.target, Some(target));

        let mut frames = 1;
        let mut last = frame;
        while last.state == EngineState::Animating {
            last = engine.tick(&InputEvent::pointer(Point2::new(-50.0, -50.0)));
            frames += 1;
            assert!(frames < 200);
        }

        assert_eq!(last.state, EngineState::Idle);
        assert_reaches(&last, &target);

        // Idle ignores pointer movement.
        let frame = engine.tick(&InputEvent::pointer(Point2::new(10.0, 10.0)));
        assert_eq!(frame.angles, last.angles);
        assert_eq!(frame.state, EngineState::Idle);
    }

    #[test]
    fn test_unreachable_click_stays_idle() {
        let mut engine = animated_engine();
        let pose = engine.angles().clone();

        let frame = engine.tick(&InputEvent::click(Point2::new(500.0, 0.0)));

        assert_eq!(frame.state, EngineState::Idle);
        assert_eq!(frame.angles, pose);
        assert_eq!(frame.target, None);
    }

    #[test]
    fn test_retarget_while_animating() {
        let mut engine = animated_engine();

        engine.tick(&InputEvent::click(Point2::new(100.0, 100.0)));
        engine.tick(&InputEvent::pointer(Point2::origin()));
        assert_eq!(engine.state(), EngineState::Animating);

        let target = Point2::new(-80.0, 120.0);
        let frame = engine.tick(&InputEvent::click(target));
        assert_eq!(frame.state, EngineState::Animating);
        assert_eq!(frame.target, Some(target));

        let mut last = frame;
        for _ in 0..200 {
            last = engine.tick(&InputEvent::pointer(Point2::origin()));
            if last.state == EngineState::Idle {
                break;
            }
        }

        assert_eq!(last.state, EngineState::Idle);
        assert_reaches(&last, &target);
    }

    #[test]
    fn test_click_near_destination_ignored() {
        let mut engine = animated_engine();

        engine.tick(&InputEvent::click(Point2::new(100.0, 100.0)));
        let frame = engine.tick(&InputEvent::click(Point2::new(102.0, 101.0)));

        assert_eq!(frame.target, Some(Point2::new(100.0, 100.0)));
    }

    #[test]
    fn test_run() {
        let mut engine = Engine::builder(LinkChain::new([150.0]).unwrap(), PointingSolver)
            .build()
            .unwrap();

        let mut input = ReplayInput(
            vec![
                InputEvent::pointer(Point2::new(0.0, 10.0)),
                InputEvent::pointer(Point2::new(-10.0, 0.0)),
                InputEvent::click(Point2::new(0.0, -10.0)),
            ]
            .into(),
        );
        let mut renderer = FrameCollector::default();

        let frames = engine.run(&mut input, &mut renderer);

        assert_eq!(frames, 3);
        assert_eq!(engine.frame_count(), 3);
        assert_eq!(
            renderer.0.iter().map(|frame| frame.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );

        let end = renderer.0[2].end_effector().unwrap();
        assert!((end - Point2::new(0.0, -150.0)).norm() < 1e-9);
        assert_eq!(engine.chain().lengths(), &[150.0]);
    }
}
