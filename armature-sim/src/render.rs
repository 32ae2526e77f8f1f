// Copyright (C) 2024 Laixer Equipment B.V.
// All rights reserved.
//
// This software may be modified and distributed under the terms
// of the included license.  See the LICENSE file for details.

use armature_core::{EngineState, Frame, Renderer};
use nalgebra::Point2;

/// Renderer reporting arm telemetry through the log.
///
/// Prints the target, the end-effector and the joint angles. State changes
/// and target changes are always reported, steady frames once per `every`
/// frames.
pub struct LogRenderer {
    every: u64,
    last_state: Option<EngineState>,
    last_target: Option<(f64, f64)>,
}

impl LogRenderer {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            last_state: None,
            last_target: None,
        }
    }

    fn hud(frame: &Frame) -> String {
        let target = match &frame.target {
            Some(target) => format!("({:7.1}, {:7.1})", target.x, target.y),
            None => "none".to_owned(),
        };

        let current = match frame.end_effector() {
            Some(point) => format!("({:7.1}, {:7.1})", point.x, point.y),
            None => "none".to_owned(),
        };

        let angles = frame
            .angles
            .to_degrees()
            .iter()
            .enumerate()
            .map(|(idx, angle)| format!("θ{}={:7.2}°", idx + 1, angle))
            .collect::<Vec<_>>()
            .join(" ");

        format!(
            "#{:<6} {:9} Target: {} Current: {} {}",
            frame.index, frame.state, target, current, angles
        )
    }
}

impl Renderer for LogRenderer {
    fn render(&mut self, frame: Frame) {
        let target = frame.target.map(|target| (target.x, target.y));

        // A tracking arm has a new target every frame.
        let changed = self.last_state != Some(frame.state)
            || (frame.state != EngineState::Tracking && self.last_target != target);

        if changed || frame.index % self.every == 0 {
            log::info!("{}", Self::hud(&frame));
        } else {
            log::trace!("{}", Self::hud(&frame));
        }

        self.last_state = Some(frame.state);
        self.last_target = target;
    }
}

#[derive(Debug, PartialEq, serde_derive::Serialize)]
struct TraceRecord {
    frame: u64,
    state: String,
    x: f64,
    y: f64,
    target_x: Option<f64>,
    target_y: Option<f64>,
    theta_1: Option<f64>,
    theta_2: Option<f64>,
    theta_3: Option<f64>,
}

impl From<&Frame> for TraceRecord {
    fn from(frame: &Frame) -> Self {
        let end = frame
            .end_effector()
            .copied()
            .unwrap_or_else(Point2::origin);
        let degrees = frame.angles.to_degrees();

        Self {
            frame: frame.index,
            state: frame.state.to_string(),
            x: end.x,
            y: end.y,
            target_x: frame.target.map(|target| target.x),
            target_y: frame.target.map(|target| target.y),
            theta_1: degrees.first().copied(),
            theta_2: degrees.get(1).copied(),
            theta_3: degrees.get(2).copied(),
        }
    }
}

/// Renderer writing one CSV row per frame.
pub struct CsvRenderer<W: std::io::Write> {
    writer: csv::Writer<W>,
    failed: bool,
}

impl CsvRenderer<std::fs::File> {
    pub fn from_path<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        Ok(Self::new(std::fs::File::create(path)?))
    }
}

impl<W: std::io::Write> CsvRenderer<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new().has_headers(true).from_writer(inner),
            failed: false,
        }
    }

    /// Flush the trace and hand back the underlying writer.
    pub fn finish(self) -> anyhow::Result<W> {
        Ok(self.writer.into_inner().map_err(|e| e.into_error())?)
    }
}

impl<W: std::io::Write> Renderer for CsvRenderer<W> {
    fn render(&mut self, frame: Frame) {
        if let Err(e) = self.writer.serialize(TraceRecord::from(&frame)) {
            if !self.failed {
                log::error!("Failed to write trace record: {}", e);
                self.failed = true;
            }
        }
    }
}

/// Renderer forwarding every frame to two renderers.
pub struct Tee<A, B>(pub A, pub B);

impl<A: Renderer, B: Renderer> Renderer for Tee<A, B> {
    fn render(&mut self, frame: Frame) {
        self.0.render(frame.clone());
        self.1.render(frame);
    }
}
