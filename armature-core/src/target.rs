// Copyright (C) 2024 Laixer Equipment B.V.
// All rights reserved.
//
// This software may be modified and distributed under the terms
// of the included license.  See the LICENSE file for details.

use nalgebra::Point2;

use crate::io::InputEvent;

/// Target acquisition mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Acquisition {
    /// A new target every frame, the arm tracks it directly.
    Continuous,
    /// Targets arrive on clicks, the arm animates toward them.
    Discrete,
}

/// Decides which point the arm reaches for.
pub trait TargetStrategy {
    fn acquisition(&self) -> Acquisition;

    /// Extract a target from the input event.
    ///
    /// `destination` is the target the arm is currently moving toward, if
    /// any. Returns `None` when the event yields no new target.
    fn acquire(
        &mut self,
        event: &InputEvent,
        destination: Option<&Point2<f64>>,
    ) -> Option<Point2<f64>>;
}

impl<T: TargetStrategy + ?Sized> TargetStrategy for Box<T> {
    fn acquisition(&self) -> Acquisition {
        (**self).acquisition()
    }

    fn acquire(
        &mut self,
        event: &InputEvent,
        destination: Option<&Point2<f64>>,
    ) -> Option<Point2<f64>> {
        (**self).acquire(event, destination)
    }
}

/// Track the pointer every frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct FollowPointer;

impl TargetStrategy for FollowPointer {
    fn acquisition(&self) -> Acquisition {
        Acquisition::Continuous
    }

    fn acquire(
        &mut self,
        event: &InputEvent,
        _destination: Option<&Point2<f64>>,
    ) -> Option<Point2<f64>> {
        Some(event.pointer)
    }
}

/// Animate toward the last click.
#[derive(Clone, Copy, Debug)]
pub struct AnimateToClick {
    /// Clicks closer than this to the current destination are ignored.
    threshold: f64,
}

impl AnimateToClick {
    pub const DEFAULT_THRESHOLD: f64 = 5.0;

    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.max(0.0),
        }
    }

    #[inline]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl Default for AnimateToClick {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD)
    }
}

impl TargetStrategy for AnimateToClick {
    fn acquisition(&self) -> Acquisition {
        Acquisition::Discrete
    }

    fn acquire(
        &mut self,
        event: &InputEvent,
        destination: Option<&Point2<f64>>,
    ) -> Option<Point2<f64>> {
        let click = event.click?;

        match destination {
            Some(destination) if (click - destination).norm() < self.threshold => {
                log::trace!("Click ({:.1}, {:.1}) within threshold", click.x, click.y);
                None
            }
            _ => Some(click),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follow_pointer() {
        let mut strategy = FollowPointer;

        let event = InputEvent::pointer(Point2::new(3.0, 4.0));
        assert_eq!(strategy.acquire(&event, None), Some(Point2::new(3.0, 4.0)));

        let destination = Point2::new(3.0, 4.0);
        assert_eq!(
            strategy.acquire(&event, Some(&destination)),
            Some(Point2::new(3.0, 4.0))
        );
        assert_eq!(strategy.acquisition(), Acquisition::Continuous);
    }

    #[test]
    fn test_animate_to_click() {
        let mut strategy = AnimateToClick::default();

        let event = InputEvent::pointer(Point2::new(3.0, 4.0));
        assert_eq!(strategy.acquire(&event, None), None);

        let event = InputEvent::click(Point2::new(50.0, 60.0));
        assert_eq!(strategy.acquire(&event, None), Some(Point2::new(50.0, 60.0)));
    }

    #[test]
    fn test_click_threshold() {
        let mut strategy = AnimateToClick::new(5.0);
        let destination = Point2::new(50.0, 60.0);

        let event = InputEvent::click(Point2::new(53.0, 63.0));
        assert_eq!(strategy.acquire(&event, Some(&destination)), None);

        let event = InputEvent::click(Point2::new(56.0, 60.0));
        assert_eq!(
            strategy.acquire(&event, Some(&destination)),
            Some(Point2::new(56.0, 60.0))
        );
    }
}
