//! Offline preview of the device command stream.
//!
//! Builds a session with the configured channel layout, feeds it a preset on
//! a virtual clock, and prints every payload with the instant it would reach
//! the device.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use patchbay_control::{ChannelError, DeviceChannel, MacroScene, Notice, Patchbay, SceneOutcome};

use super::common::{load_settings, resolve_preset};

#[derive(Args)]
pub struct SimulateArgs {
    /// Preset id, name, or path to a preset TOML file
    preset: String,

    /// Treat the link as freshly connected: reset every channel, then replay the graph
    #[arg(long)]
    reconnect: bool,

    /// Pretend the sequencer is playing, so the preset waits for a step boundary
    #[arg(long)]
    playing: bool,

    /// Also recall a macro scene (A-D) on the master FX
    #[arg(long, value_parser = parse_macro_scene)]
    macro_scene: Option<MacroScene>,

    /// Stop after this many milliseconds of virtual time
    #[arg(long, default_value = "10000")]
    until_ms: u64,

    /// Only print the summary
    #[arg(short, long)]
    quiet: bool,

    /// Settings file (defaults to the user config file)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn parse_macro_scene(label: &str) -> Result<MacroScene, String> {
    MacroScene::from_label(label).ok_or_else(|| format!("unknown macro scene '{label}', expected A-D"))
}

/// Channel that timestamps each payload with the simulated clock.
#[derive(Default)]
struct TimedChannel {
    now: Duration,
    log: Vec<(Duration, String)>,
}

impl DeviceChannel for TimedChannel {
    fn is_open(&self) -> bool {
        true
    }

    fn send(&mut self, payload: &str) -> Result<(), ChannelError> {
        self.log.push((self.now, payload.to_string()));
        Ok(())
    }
}

pub fn run(args: SimulateArgs) -> anyhow::Result<()> {
    let settings = load_settings(args.config.as_deref())?;
    let preset = resolve_preset(&args.preset)?;
    let until = Duration::from_millis(args.until_ms);
    let step_period = Duration::from_millis(125);

    let mut pb = Patchbay::new(settings, TimedChannel::default());
    if args.playing {
        pb.on_message(r#"{"type":"playState","playing":true}"#, Duration::ZERO);
        pb.on_message(r#"{"step":1}"#, Duration::ZERO);
    }
    let outcome = pb.apply_preset(&preset, Duration::ZERO)?;
    if outcome == SceneOutcome::Queued {
        tracing::info!(preset = %preset.name, "waiting for step boundary");
    }
    if args.reconnect {
        pb.on_channel_up(Duration::ZERO);
    }
    if let Some(scene) = args.macro_scene {
        pb.select_macro_scene(scene, Duration::ZERO);
    }

    // Drive the session, and the sequencer's steps when playing.
    let mut clock = Duration::ZERO;
    let mut step = 1u32;
    let mut next_step = step_period;
    loop {
        let wake = pb.next_wake();
        let step_due = args.playing && next_step <= until;
        let at = match (wake, step_due) {
            (Some(w), true) => w.min(next_step),
            (Some(w), false) => w,
            (None, true) => next_step,
            (None, false) => break,
        }
        .max(clock);
        if at > until {
            break;
        }
        clock = at;
        pb.channel_mut().now = clock;
        if step_due && next_step <= clock {
            step += 1;
            pb.on_message(&format!(r#"{{"step":{step}}}"#), clock);
            next_step += step_period;
        }
        pb.poll(clock);
    }

    if !args.quiet {
        for (at, payload) in &pb.channel().log {
            println!("{:>8.1} ms  {payload}", at.as_secs_f64() * 1000.0);
        }
        println!();
    }

    for notice in pb.drain_notices() {
        match notice {
            Notice::SceneApplied {
                label,
                skipped_edges,
            } => println!("Applied '{label}' ({skipped_edges} edges skipped)"),
            Notice::SceneQueued { label } => println!("Queued '{label}' for next step boundary"),
            Notice::ReconciliationOverflow { skipped } => {
                println!("Reconciliation skipped {skipped} edges");
            }
            Notice::FilterLimitReached { .. } => {}
        }
    }
    let stats = pb.dispatch_stats();
    let span = pb
        .channel()
        .log
        .last()
        .map_or(0.0, |(at, _)| at.as_secs_f64() * 1000.0);
    println!(
        "{} payloads sent over {span:.1} ms ({} dropped on overflow, {} still pending)",
        stats.sent,
        stats.dropped_overflow,
        pb.pending_sends()
    );
    Ok(())
}
