//! The SenseDash terminal dashboard.
//!
//! Log output goes to stderr, which shares the screen with the dashboard;
//! redirect it when running with `RUST_LOG` set:
//!
//! ```text
//! RUST_LOG=debug sensedash demo 2> sensedash.log
//! sensedash --policy compress serial --port /dev/ttyACM0
//! sensedash replay capture.txt --chunk 20 --interval-ms 5
//! ```

use clap::Parser;
use log::error;
use sensedash::{
    args::{DashArgs, ReplayCommand, SerialCommand, SourceCommand},
    dummy_source::DummySource,
    gui::{device_selector, run_dashboard, Connector, DashGuiError},
    transport::{available_ports, replay_link, serial_link, TransportError},
};

use std::{
    fs::File,
    io,
    path::Path,
    process::ExitCode,
    time::Duration,
};

fn main() -> ExitCode {
    env_logger::init();
    let args = DashArgs::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("sensedash: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: DashArgs) -> Result<(), DashGuiError> {
    let config = args.resolve_config()?;

    let connector: Connector = match args.command {
        SourceCommand::Serial(SerialCommand { port, .. }) => {
            let port = match port {
                Some(port) => port,
                None => match device_selector(available_ports()?)? {
                    Some(port) => port,
                    // The user backed out of the selector
                    None => return Ok(()),
                },
            };
            let baud_rate = config.baud_rate;
            Box::new(move || serial_link(&port, baud_rate))
        }
        SourceCommand::Replay(replay) => Box::new(move || open_replay(&replay)),
        SourceCommand::Demo(demo) => Box::new(move || {
            Ok(DummySource::builder()
                .record_rate(demo.rate)
                .build()
                .spawn())
        }),
    };

    run_dashboard(&config, connector)
}

fn open_replay(replay: &ReplayCommand) -> Result<sensedash::transport::Link, TransportError> {
    let interval = Duration::from_millis(replay.interval_ms);

    if replay.file == Path::new("-") {
        return Ok(replay_link("stdin", io::stdin(), replay.chunk, interval));
    }

    let file = File::open(&replay.file).map_err(|source| TransportError::Open {
        path: replay.file.clone(),
        source,
    })?;
    Ok(replay_link(
        replay.file.display().to_string(),
        file,
        replay.chunk,
        interval,
    ))
}
