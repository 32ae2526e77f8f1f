// Copyright (C) 2024 Laixer Equipment B.V.
// All rights reserved.
//
// This software may be modified and distributed under the terms
// of the included license.  See the LICENSE file for details.

use nalgebra::Point2;

use crate::chain::{JointAngles, JointPositions};
use crate::engine::EngineState;

/// Pointer sample delivered once per frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InputEvent {
    /// Current pointer position.
    pub pointer: Point2<f64>,
    /// Click position, if a click happened this frame.
    pub click: Option<Point2<f64>>,
}

impl InputEvent {
    /// Pointer movement without a click.
    pub fn pointer(pointer: Point2<f64>) -> Self {
        Self {
            pointer,
            click: None,
        }
    }

    /// Click at the pointer position.
    pub fn click(pointer: Point2<f64>) -> Self {
        Self {
            pointer,
            click: Some(pointer),
        }
    }
}

/// Source of pointer input.
pub trait Input {
    /// Poll the input for the next frame.
    ///
    /// Returns `None` when the input is exhausted or the user asked to quit.
    fn poll(&mut self) -> Option<InputEvent>;
}

/// Everything the renderer needs to draw one frame.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Frame counter, starts at zero.
    pub index: u64,
    /// Engine state after this frame.
    pub state: EngineState,
    /// Joint positions, origin first and end-effector last.
    pub positions: JointPositions,
    /// Joint angles after this frame.
    pub angles: JointAngles,
    /// Current target or animation destination.
    pub target: Option<Point2<f64>>,
}

impl Frame {
    /// End-effector position.
    pub fn end_effector(&self) -> Option<&Point2<f64>> {
        self.positions.last()
    }
}

/// Consumer of simulated frames.
pub trait Renderer {
    /// Draw the frame.
    ///
    /// Called exactly once per frame. The frame is handed over by value.
    fn render(&mut self, frame: Frame);
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn render(&mut self, frame: Frame) {
        (**self).render(frame)
    }
}

impl<I: Input + ?Sized> Input for Box<I> {
    fn poll(&mut self) -> Option<InputEvent> {
        (**self).poll()
    }
}

/// Renderer collecting every frame, used in tests.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct FrameCollector(pub Vec<Frame>);

#[cfg(test)]
impl Renderer for FrameCollector {
    fn render(&mut self, frame: Frame) {
        self.0.push(frame);
    }
}

/// Input replaying a fixed list of events, used in tests.
#[cfg(test)]
pub(crate) struct ReplayInput(pub std::collections::VecDeque<InputEvent>);

#[cfg(test)]
impl Input for ReplayInput {
    fn poll(&mut self) -> Option<InputEvent> {
        self.0.pop_front()
    }
}
