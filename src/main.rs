//! Strider - Headless Entry Point
//!
//! Runs the simulation without a renderer, feeding a scripted walk through
//! the same input path a windowed host would use.
//!
//! ```text
//! strider [config.json] [--seconds N]
//! ```

use std::process::ExitCode;

use strider_game::{Frame, Key, SimulationConfig};

/// Display ticks per simulated second.
const DISPLAY_RATE: u32 = 60;

struct Args {
    config: Option<String>,
    seconds: u32,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        config: None,
        seconds: 10,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--seconds" => {
                let value = iter.next().ok_or("--seconds needs a value")?;
                args.seconds = value
                    .parse()
                    .map_err(|_| format!("invalid --seconds value: {}", value))?;
            }
            _ if arg.starts_with("--") => return Err(format!("unknown option: {}", arg)),
            _ => args.config = Some(arg),
        }
    }
    Ok(args)
}

/// Input script: settle, walk, jump, then turn while walking.
fn drive(frame: &mut Frame<strider_physics::RapierWorld, strider_world::HeadlessScene>, tick: u32) {
    let t = tick as f32 / DISPLAY_RATE as f32;
    let input = frame.input_mut();

    if tick == DISPLAY_RATE {
        input.key_down(Key::Forward, false);
    } else if tick == 2 * DISPLAY_RATE {
        input.key_down(Key::Jump, false);
    } else if tick == 2 * DISPLAY_RATE + 6 {
        input.key_up(Key::Jump);
    }

    if (4.0..6.0).contains(&t) {
        input.pointer_moved(8.0, 0.0);
    }
}

fn run(args: Args) -> Result<(), strider_game::ConfigError> {
    let config = match &args.config {
        Some(path) => {
            log::info!("Loading config from {}", path);
            SimulationConfig::load(path)?
        }
        None => SimulationConfig::default(),
    };

    let mut frame = Frame::headless(config)?;
    let delta = 1.0 / DISPLAY_RATE as f32;
    let mut jumps = 0;

    for tick in 0..args.seconds * DISPLAY_RATE {
        drive(&mut frame, tick);
        let stats = frame.advance(delta);

        if stats.control.is_some_and(|c| c.jumped) {
            jumps += 1;
        }

        if (tick + 1) % DISPLAY_RATE == 0 {
            let position = frame.player_position();
            let grounded = frame
                .controller()
                .last_probe()
                .is_some_and(|probe| probe.grounded);
            log::info!(
                "t={}s ticks={} pos=({:.2}, {:.2}, {:.2}) grounded={} chunks={}",
                (tick + 1) / DISPLAY_RATE,
                frame.clock().total_ticks(),
                position.x,
                position.y,
                position.z,
                grounded,
                frame.terrain().len()
            );
        }
    }

    log::info!(
        "Finished: {} display ticks, {} physics ticks, {} jumps",
        frame.frame_count(),
        frame.clock().total_ticks(),
        jumps
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            eprintln!("usage: strider [config.json] [--seconds N]");
            return ExitCode::FAILURE;
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
