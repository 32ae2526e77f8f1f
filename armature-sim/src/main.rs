// Copyright (C) 2024 Laixer Equipment B.V.
// All rights reserved.
//
// This software may be modified and distributed under the terms
// of the included license.  See the LICENSE file for details.

use std::time::Duration;

use armature_core::{ArmKind, Engine, Input, Renderer};
use clap::Parser;

mod config;
mod input;
mod render;

#[derive(Parser)]
#[command(author = "Copyright (C) 2024 Laixer Equipment B.V.")]
#[command(version, propagate_version = true)]
#[command(about = "Planar arm kinematics simulator", long_about = None)]
struct Args {
    /// Arm configuration.
    #[arg(value_parser = parse_arm, value_name = "ARM")]
    arm: ArmKind,
    /// Link lengths, must match the number of links of the arm.
    #[arg(long, num_args = 1.., allow_negative_numbers = true, value_name = "L")]
    links: Vec<f64>,
    /// Configuration file.
    #[arg(short = 'c', long = "config", alias = "conf", value_name = "FILE")]
    config: Option<std::path::PathBuf>,
    /// Replay pointer input from a JSON script.
    #[arg(long, value_name = "FILE")]
    script: Option<std::path::PathBuf>,
    /// Write a CSV trace of every frame.
    #[arg(long, value_name = "FILE")]
    trace: Option<std::path::PathBuf>,
    /// Stop after this many frames.
    #[arg(long, value_name = "N")]
    frames: Option<u64>,
    /// Frames per second, zero runs unpaced.
    #[arg(long)]
    frame_rate: Option<u32>,
    /// Quiet output (no logging).
    #[arg(long)]
    quiet: bool,
    /// Level of verbosity.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_arm(value: &str) -> Result<ArmKind, String> {
    value.parse().map_err(|e: armature_core::ConfigError| e.to_string())
}

/// Wait for the next frame slot.
async fn pace(interval: &mut Option<tokio::time::Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => tokio::task::yield_now().await,
    }
}

/// Drive the engine until the input is exhausted, the frame limit is hit or
/// the process is interrupted.
async fn simulate<R: Renderer>(
    engine: &mut Engine,
    input: &mut dyn Input,
    renderer: &mut R,
    period: Option<Duration>,
    limit: Option<u64>,
) -> anyhow::Result<u64> {
    let mut interval = period.map(|period| {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        interval
    });

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut frames = 0;

    loop {
        if limit.is_some_and(|limit| frames >= limit) {
            log::debug!("Frame limit reached");
            break;
        }

        tokio::select! {
            result = &mut shutdown => {
                result?;
                log::info!("Termination requested");
                break;
            }
            _ = pace(&mut interval) => {}
        }

        let Some(event) = input.poll() else {
            log::debug!("Input exhausted");
            break;
        };

        renderer.render(engine.tick(&event));
        frames += 1;
    }

    Ok(frames)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    use log::LevelFilter;

    let args = Args::parse();

    let mut log_config = simplelog::ConfigBuilder::new();
    log_config.set_target_level(LevelFilter::Off);
    log_config.set_location_level(LevelFilter::Off);
    log_config.add_filter_ignore_str("mio");

    let log_level = if args.quiet {
        LevelFilter::Off
    } else {
        match args.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    simplelog::TermLogger::init(
        log_level,
        log_config.build(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let mut config = match &args.config {
        Some(path) => config::SimConfig::from_file(path)?,
        None => config::SimConfig::default(),
    };

    if let Some(frame_rate) = args.frame_rate {
        config.frame_rate = frame_rate;
    }

    log::trace!("{:#?}", config);

    let settings = config.engine_settings()?;
    let mut engine = args.arm.engine(&args.links, &settings)?;

    log::info!(
        "Arm {} with links {} ({} solver)",
        args.arm,
        engine.chain(),
        engine.solver_name()
    );

    let mut input: Box<dyn Input> = match &args.script {
        Some(path) => {
            let script = input::ScriptedInput::load(path)?;
            if script.is_empty() {
                log::warn!("Script {} has no events", path.display());
            } else {
                log::debug!("Loaded {} events from {}", script.len(), path.display());
            }
            Box::new(script)
        }
        None => Box::new(
            input::OrbitInput::for_reach(
                *engine.origin(),
                engine.chain().min_reach(),
                engine.chain().reach(),
            )
            .with_click_interval(config.orbit.click_interval),
        ),
    };

    let period = config.frame_period();
    let every = u64::from(config.frame_rate.max(1));

    let frames = match &args.trace {
        Some(path) => {
            let mut renderer = render::Tee(
                render::LogRenderer::new(every),
                render::CsvRenderer::from_path(path)?,
            );

            let frames = simulate(&mut engine, input.as_mut(), &mut renderer, period, args.frames)
                .await?;

            renderer.1.finish()?;
            log::info!("Trace written to {}", path.display());

            frames
        }
        None => {
            let mut renderer = render::LogRenderer::new(every);

            simulate(&mut engine, input.as_mut(), &mut renderer, period, args.frames).await?
        }
    };

    log::info!("Simulated {} frames", frames);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_trace() {
        let config = config::SimConfig::default();
        let mut engine = ArmKind::Mouse2LinkGeometric
            .engine(&[], &config.engine_settings().unwrap())
            .unwrap();

        let mut input = input::ScriptedInput::from_json(
            r#"[
                {"pointer": [550, 300]},
                {"pointer": [700, 300]},
                {"pointer": [400, 450], "click": true}
            ]"#,
        )
        .unwrap();
        let mut renderer = render::CsvRenderer::new(Vec::new());

        assert_eq!(engine.run(&mut input, &mut renderer), 3);

        let output = String::from_utf8(renderer.finish().unwrap()).unwrap();
        let rows = output
            .lines()
            .skip(1)
            .map(|line| line.split(',').map(str::to_owned).collect::<Vec<_>>())
            .collect::<Vec<_>>();

        assert_eq!(rows.len(), 3);

        let x = rows[0][2].parse::<f64>().unwrap();
        assert!((x - 550.0).abs() < 1e-6);

        // Out of reach, the pose of the first frame is held.
        assert_eq!(rows[1][2], rows[0][2]);
        assert_eq!(rows[1][3], rows[0][3]);

        let y = rows[2][3].parse::<f64>().unwrap();
        assert!((y - 450.0).abs() < 1e-6);
    }

    #[test]
    fn test_link_mismatch_fails_fast() {
        let settings = config::SimConfig::default().engine_settings().unwrap();

        assert!(ArmKind::Mouse1Link.engine(&[100.0, 100.0], &settings).is_err());
        assert!(ArmKind::Mouse3Link.engine(&[100.0, 0.0, 50.0], &settings).is_err());
    }

    #[test]
    fn test_args() {
        let args = Args::try_parse_from([
            "armature",
            "mouse_3link",
            "--links",
            "120",
            "80",
            "-40",
            "--frames",
            "10",
        ])
        .unwrap();

        assert_eq!(args.arm, ArmKind::Mouse3Link);
        assert_eq!(args.links, vec![120.0, 80.0, -40.0]);
        assert_eq!(args.frames, Some(10));

        assert!(Args::try_parse_from(["armature", "mouse_4link"]).is_err());
    }
}
