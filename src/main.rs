//! Bat sonar headless rollout
//!
//! Runs episodes of the environment with a simple built-in policy and logs
//! per-episode returns. Optionally writes a JSON trace sampled at the render
//! frame rate.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use glam::Vec2;
use log::info;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use bat_sonar::renderer::ticks_per_frame;
use bat_sonar::settings::ActionLayout;
use bat_sonar::{Action, BatEnv, EnvPreset, EnvSettings};

#[derive(Parser, Debug)]
#[command(name = "bat-sonar")]
#[command(about = "Headless rollouts of the echolocating bat environment")]
struct Cli {
    /// Built-in settings preset (flying, lidar)
    #[arg(long, default_value = "flying", value_parser = parse_preset)]
    preset: EnvPreset,
    /// JSON settings file; overrides --preset
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    #[arg(long, default_value_t = 1)]
    episodes: u32,
    #[arg(long, value_enum, default_value_t = Policy::Random)]
    policy: Policy,
    /// Write a JSON trace here, one entry per rendered frame
    #[arg(long)]
    trace: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Policy {
    /// Uniform actions within the layout bounds
    Random,
    /// Gentle forward thrust, pulsing straight ahead every step
    Cruise,
}

fn parse_preset(s: &str) -> Result<EnvPreset, String> {
    EnvPreset::from_str(s).ok_or_else(|| format!("unknown preset '{s}' (expected flying or lidar)"))
}

#[derive(Debug, Serialize)]
struct TraceStep {
    episode: u64,
    tick: u64,
    position: Vec2,
    heading: f32,
    reward: f32,
    bumped: bool,
    pulse_fired: bool,
    observation: Vec<f32>,
}

#[derive(Debug, Default, Serialize)]
struct EpisodeSummary {
    episode: u64,
    steps: u64,
    total_reward: f32,
    bumps: u32,
    pulses: u32,
}

fn choose_action(policy: Policy, layout: ActionLayout, heading: f32, rng: &mut Pcg32) -> Action {
    match policy {
        Policy::Random => {
            let raw: Vec<f32> = layout
                .low()
                .iter()
                .zip(layout.high())
                .map(|(&lo, &hi)| rng.random_range(lo..=hi))
                .collect();
            Action::from_slice(layout, &raw).unwrap_or(Action::Polar {
                accel: 0.0,
                accel_angle: 0.0,
                pulse_proba: 0.0,
                pulse_angle: 0.0,
            })
        }
        Policy::Cruise => match layout {
            ActionLayout::Cartesian => Action::Cartesian {
                accel: Vec2::from_angle(heading) * 0.2,
                pulse: Vec2::X,
                pulse_proba: 1.0,
            },
            ActionLayout::Polar => Action::Polar {
                accel: 0.2,
                accel_angle: 0.0,
                pulse_proba: 1.0,
                pulse_angle: 0.0,
            },
        },
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => EnvSettings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => EnvSettings::from_preset(cli.preset),
    };
    info!(
        "Bat sonar starting: preset={} seed={} episodes={} policy={:?}",
        settings.preset.as_str(),
        cli.seed,
        cli.episodes,
        cli.policy
    );

    let layout = settings.action_layout;
    let trace_stride = u64::from(ticks_per_frame(settings.dt));
    let mut env = BatEnv::new(settings, cli.seed).context("invalid settings")?;
    // Policy RNG is separate so the environment stream replays identically
    let mut policy_rng = Pcg32::seed_from_u64(cli.seed.wrapping_add(1));
    let mut trace = Vec::new();
    let mut summaries = Vec::with_capacity(cli.episodes as usize);

    for n in 0..cli.episodes {
        if n > 0 {
            env.reset();
        }
        let mut summary = EpisodeSummary {
            episode: env.episode(),
            ..Default::default()
        };

        loop {
            let action = choose_action(cli.policy, layout, env.bat().heading, &mut policy_rng);
            let step = env.step(&action);

            summary.steps += 1;
            summary.total_reward += step.reward;
            summary.bumps += u32::from(step.info.bumped);
            summary.pulses += u32::from(step.info.pulse_fired);

            if cli.trace.is_some() && (step.done || summary.steps % trace_stride == 0) {
                trace.push(TraceStep {
                    episode: summary.episode,
                    tick: env.bat().time_ticks,
                    position: env.bat().position,
                    heading: env.bat().heading,
                    reward: step.reward,
                    bumped: step.info.bumped,
                    pulse_fired: step.info.pulse_fired,
                    observation: step.observation,
                });
            }

            if step.done {
                break;
            }
        }

        info!(
            "Episode {}: steps={} return={:.3} bumps={} pulses={}",
            summary.episode, summary.steps, summary.total_reward, summary.bumps, summary.pulses
        );
        summaries.push(summary);
    }

    if let Some(path) = &cli.trace {
        let json = serde_json::to_string_pretty(&trace)?;
        std::fs::write(path, json).with_context(|| format!("writing trace to {}", path.display()))?;
        info!("Wrote {} trace steps to {}", trace.len(), path.display());
    }

    let best = summaries
        .iter()
        .map(|s| s.total_reward)
        .reduce(f32::max)
        .ok_or_else(|| anyhow!("no episodes were run"))?;
    println!("{}", serde_json::to_string(&summaries)?);
    info!("Best return: {best:.3}");

    Ok(())
}
