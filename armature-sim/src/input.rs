// Copyright (C) 2024 Laixer Equipment B.V.
// All rights reserved.
//
// This software may be modified and distributed under the terms
// of the included license.  See the LICENSE file for details.

use std::{collections::VecDeque, path::Path};

use armature_core::math::lerp;
use armature_core::{Input, InputEvent};
use nalgebra::{Point2, Vector2};

#[derive(Debug, serde_derive::Deserialize)]
struct ScriptEntry {
    pointer: [f64; 2],
    #[serde(default)]
    click: bool,
}

impl From<ScriptEntry> for InputEvent {
    fn from(entry: ScriptEntry) -> Self {
        let pointer = Point2::new(entry.pointer[0], entry.pointer[1]);

        if entry.click {
            InputEvent::click(pointer)
        } else {
            InputEvent::pointer(pointer)
        }
    }
}

/// Input replaying a recorded event script.
///
/// The script is a JSON array with one entry per frame, for example
/// `[{"pointer": [420, 300]}, {"pointer": [500, 250], "click": true}]`.
pub struct ScriptedInput(VecDeque<InputEvent>);

impl ScriptedInput {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let str = std::fs::read_to_string(path)?;

        Self::from_json(&str)
    }

    pub fn from_json(str: &str) -> anyhow::Result<Self> {
        let events = serde_json::from_str::<Vec<ScriptEntry>>(str)?
            .into_iter()
            .map(InputEvent::from)
            .collect();

        Ok(Self(events))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Input for ScriptedInput {
    fn poll(&mut self) -> Option<InputEvent> {
        self.0.pop_front()
    }
}

/// Synthetic pointer orbiting the arm origin.
///
/// The pointer circles the origin while its radius swings between an inner
/// and an outer bound. Every `click_interval` frames the pointer clicks.
pub struct OrbitInput {
    origin: Point2<f64>,
    inner: f64,
    outer: f64,
    /// Angular speed in radians per frame.
    speed: f64,
    click_interval: u64,
    frame: u64,
}

impl OrbitInput {
    /// Frames per full radius swing.
    const SWING_PERIOD: f64 = 240.0;

    pub fn new(origin: Point2<f64>, inner: f64, outer: f64) -> Self {
        Self {
            origin,
            inner: inner.min(outer),
            outer: outer.max(inner),
            speed: 0.02,
            click_interval: 90,
            frame: 0,
        }
    }

    /// Orbit matched to the reach of an arm.
    ///
    /// The outer bound exceeds the reach so the arm also meets targets it
    /// cannot touch.
    pub fn for_reach(origin: Point2<f64>, min_reach: f64, reach: f64) -> Self {
        Self::new(origin, (min_reach + 0.1 * reach).min(reach), 1.1 * reach)
    }

    pub fn with_click_interval(mut self, click_interval: u64) -> Self {
        self.click_interval = click_interval.max(1);
        self
    }

    fn pointer(&self) -> Point2<f64> {
        let frame = self.frame as f64;

        let swing = 0.5 - 0.5 * (std::f64::consts::TAU * frame / Self::SWING_PERIOD).cos();
        let radius = lerp(self.inner, self.outer, swing);
        let bearing = self.speed * frame;

        self.origin + Vector2::new(bearing.cos(), bearing.sin()) * radius
    }
}

impl Input for OrbitInput {
    fn poll(&mut self) -> Option<InputEvent> {
        let pointer = self.pointer();

        let event = if self.frame > 0 && self.frame % self.click_interval == 0 {
            InputEvent::click(pointer)
        } else {
            InputEvent::pointer(pointer)
        };

        self.frame += 1;

        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script() {
        let mut input = ScriptedInput::from_json(
            r#"[
                {"pointer": [420.0, 300.0]},
                {"pointer": [500, 250], "click": true},
                {"pointer": [510, 250], "click": false}
            ]"#,
        )
        .unwrap();

        assert_eq!(input.len(), 3);

        let event = input.poll().unwrap();
        assert_eq!(event.pointer, Point2::new(420.0, 300.0));
        assert_eq!(event.click, None);

        let event = input.poll().unwrap();
        assert_eq!(event.click, Some(Point2::new(500.0, 250.0)));

        assert_eq!(input.poll().unwrap().click, None);
        assert!(input.poll().is_none());
        assert!(input.is_empty());
    }

    #[test]
    fn test_script_invalid() {
        assert!(ScriptedInput::from_json(r#"[{"pointer": [1.0]}]"#).is_err());
        assert!(ScriptedInput::from_json(r#"{"pointer": [1.0, 2.0]}"#).is_err());
    }

    #[test]
    fn test_orbit_bounds() {
        let origin = Point2::new(400.0, 300.0);
        let mut input = OrbitInput::new(origin, 50.0, 200.0).with_click_interval(10);

        let mut clicks = 0;
        for _ in 0..500 {
            let event = input.poll().unwrap();

            let radius = (event.pointer - origin).norm();
            assert!((50.0 - 1e-9..=200.0 + 1e-9).contains(&radius));

            if event.click.is_some() {
                clicks += 1;
            }
        }

        assert_eq!(clicks, 49);
    }

    #[test]
    fn test_orbit_for_reach() {
        let origin = Point2::origin();
        let mut input = OrbitInput::for_reach(origin, 0.0, 200.0);

        let event = input.poll().unwrap();
        assert!(((event.pointer - origin).norm() - 20.0).abs() < 1e-9);
        assert_eq!(event.click, None);
    }
}
