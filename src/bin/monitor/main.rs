//! Runs the SenseDash pipeline against the simulated wearable with no
//! terminal UI, logging what the dashboard would be showing.

use clap::Parser;
use log::{error, info};
use sensedash::{
    args::PolicyArg,
    config::DashConfig,
    dummy_source::DummySource,
    session::Session,
    window_store::{Channel, NullSink},
};

use std::{path::PathBuf, process::ExitCode, thread::sleep, time::Duration};

#[derive(Debug, Parser)]
#[clap(version, about)]
struct MonitorArgs {
    /// Records per second from the simulated wearable
    #[arg(short = 'r', long = "rate", default_value_t = 5.0)]
    rate: f64,

    /// Stop after this many records
    #[arg(short = 'n', long = "records")]
    records: Option<usize>,

    /// Number of points kept on each chart
    #[arg(long = "capacity", default_value_t = 50)]
    capacity: usize,

    /// What a chart does when it is full
    #[arg(short = 'p', long = "policy", value_enum, default_value = "shift")]
    policy: PolicyArg,

    /// Export the collected samples here once the stream ends
    #[arg(short = 'o', long = "export-dir")]
    export_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = MonitorArgs::parse();

    let config = DashConfig {
        capacity: args.capacity,
        policy: args.policy.into(),
        ..DashConfig::default()
    };
    if let Err(e) = config.validate() {
        error!("{}", e);
        return ExitCode::FAILURE;
    }

    let mut builder = DummySource::builder().record_rate(args.rate);
    if let Some(records) = args.records {
        builder = builder.limit(records);
    }
    let link = builder.build().spawn();
    let mut session = Session::new(&config, NullSink);

    while session.drain(link.events()) {
        report(&session);
        sleep(Duration::from_millis(500));
    }
    report(&session);

    if let Some(dir) = args.export_dir {
        match session.export(dir, chrono::Utc::now()) {
            Ok(Some(path)) => info!("Wrote {}", path.display()),
            Ok(None) => info!("No samples, nothing written"),
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

fn report(session: &Session<NullSink>) {
    let store = session.store();
    for channel in Channel::NUMERIC {
        if let Some(window) = store.window(channel) {
            info!(
                "{:<12} points: {:>3}  latest: {:?}  mean: {:?}",
                channel.title(),
                window.len(),
                window.latest().and_then(|p| p.value),
                window.mean(),
            );
        }
    }
    info!(
        "{:<12} {} ({:+.1}°)   status: {}   samples: {}   dropped: {}",
        Channel::HeadPosition.title(),
        store.head().label(),
        store.head().angle_degrees(),
        session.status(),
        session.log().len(),
        session.dropped(),
    );
}
