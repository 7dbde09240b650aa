//! Desktop simulator for a knob-driven potentiometer.
//!
//! Drives a [`Potentiometer`] through simulated encoder lines and prints
//! every value change.
//!
//! ```text
//! cargo run --features sim --bin knob-sim -- --steps 8 --script "RRRR l RR"
//! RUST_LOG=rs_knob=trace cargo run --features sim --bin knob-sim -- --script "R"
//! ```
//!
//! Script characters:
//!
//! - `R` / `L`: one full Gray-code cycle clockwise / counter-clockwise
//!   (two clk edges)
//! - `r` / `l`: a single clk edge
//! - `b`: a bounce (duplicate clk notification with no movement)
//! - whitespace is ignored

use anyhow::{bail, Context};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use rs_knob::config::{Config, InputConfig, PotentiometerConfig};
use rs_knob::hal::MockEncoderPins;
use rs_knob::{DispatchPolicy, Input, Potentiometer, PotentiometerEvent, RotationCounter};

#[derive(Parser, Debug)]
#[command(name = "knob-sim", about = "Simulate a rotary encoder driving a potentiometer")]
struct Args {
    /// Starting value (clamped into 0.0..=1.0)
    #[arg(long, default_value_t = 0.0)]
    initial: f32,

    /// Rotation events needed to sweep the full range
    #[arg(long, default_value_t = 32.0)]
    steps: f32,

    /// Movement script (R, L, r, l, b)
    #[arg(long, default_value = "RRRR")]
    script: String,

    /// Keep dispatching when a subscriber fails
    #[arg(long)]
    isolate: bool,

    /// Label for the clk line
    #[arg(long, default_value = "clk")]
    clk_label: String,

    /// Label for the dt line
    #[arg(long, default_value = "dt")]
    dt_label: String,
}

impl Args {
    fn config(&self) -> Config {
        Config::default()
            .with_inputs(
                InputConfig::default()
                    .with_clk_label(&self.clk_label)
                    .with_dt_label(&self.dt_label),
            )
            .with_potentiometer(PotentiometerConfig::new(self.initial, self.steps))
            .with_dispatch(if self.isolate {
                DispatchPolicy::Isolate
            } else {
                DispatchPolicy::FailFast
            })
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = args.config();

    let pins = MockEncoderPins::with_labels(
        config.inputs.clk_label.as_str(),
        config.inputs.dt_label.as_str(),
    );
    let pot = Potentiometer::from_config(pins.clk(), pins.dt(), &config)
        .context("invalid potentiometer configuration")?;
    let counter = RotationCounter::attach(pot.encoder());

    pot.subscribe(PotentiometerEvent::ValueChanged, |event| {
        println!("value {:.4} ({:>3}%)", event.value, (event.value * 100.0).round());
        Ok(())
    });

    println!(
        "start {:.4}, step {:.4}, lines {}/{}",
        pot.value(),
        pot.step(),
        pot.encoder().clk().label(),
        pot.encoder().dt().label()
    );

    for (index, c) in args.script.chars().enumerate() {
        match c {
            'R' => pins.turn_right(2)?,
            'L' => pins.turn_left(2)?,
            'r' => pins.turn_right(1)?,
            'l' => pins.turn_left(1)?,
            'b' => {
                let clk = pins.clk();
                clk.notify(clk.get())?;
            }
            c if c.is_whitespace() => continue,
            other => bail!("unknown script character {other:?} at position {index}"),
        }
    }

    println!(
        "end {:.4} ({}%), net rotation events {}",
        pot.value(),
        pot.percent(),
        counter.position()
    );
    Ok(())
}
