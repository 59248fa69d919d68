//! A pretend wearable, for running the dashboard without hardware.
//!
//! The firmware pushes its lines out over BLE in 20 byte writes, so records
//! rarely arrive in one piece. [`DummySource`] does the same: it generates
//! plausible records and hands them to the link in randomly sized chunks
//! that cut straight through record boundaries.

use crate::head_position::HeadPosition;
use crate::transport::{pause, Link, LinkEvent};

use rand::prelude::*;
use std::{sync::atomic::Ordering, time::Duration};

/// Largest write the firmware makes in one go.
pub const BLE_CHUNK: usize = 20;

/// Configures and starts a [`DummySource`].
#[derive(Debug, Clone)]
pub struct DummySourceBuilder {
    record_rate: f64,
    max_chunk: usize,
    limit: Option<usize>,
}

impl Default for DummySourceBuilder {
    fn default() -> Self {
        Self {
            record_rate: 1.0,
            max_chunk: BLE_CHUNK,
            limit: None,
        }
    }
}

impl DummySourceBuilder {
    /// Records per second.
    pub fn record_rate(mut self, record_rate: f64) -> Self {
        self.record_rate = record_rate;
        self
    }

    /// Upper bound on the size of each chunk.
    pub fn max_chunk(mut self, max_chunk: usize) -> Self {
        self.max_chunk = max_chunk.max(1);
        self
    }

    /// Stop after this many records instead of running forever.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Finishes configuration. Nothing runs until [`DummySource::spawn`].
    pub fn build(self) -> DummySource {
        DummySource {
            settings: self,
            wearer: Wearer::default(),
        }
    }
}

/// A configured but not yet running dummy wearable.
pub struct DummySource {
    settings: DummySourceBuilder,
    wearer: Wearer,
}

impl DummySource {
    /// Starts configuring a source with one record per second.
    pub fn builder() -> DummySourceBuilder {
        DummySourceBuilder::default()
    }

    /// Starts generating on a background thread.
    pub fn spawn(self) -> Link {
        let DummySource {
            settings,
            mut wearer,
        } = self;

        let period = record_period(settings.record_rate);

        Link::spawn("Dummy Wearable", move |tx, stop| {
            let mut rng = thread_rng();
            let mut outgoing: Vec<u8> = Vec::new();
            let mut sent = 0;

            while !stop.load(Ordering::Relaxed) && settings.limit.map_or(true, |l| sent < l) {
                let time = chrono::Local::now().format("%H:%M:%S").to_string();
                outgoing.extend_from_slice(wearer.next_record(&mut rng, &time).as_bytes());
                sent += 1;

                // Whatever does not fill a chunk waits for the next record
                let flush = settings.limit == Some(sent);
                for chunk in take_chunks(&mut outgoing, settings.max_chunk, flush, &mut rng) {
                    if tx.send(LinkEvent::Chunk(chunk)).is_err() {
                        return Ok(());
                    }
                }

                if !period.is_zero() && !pause(period, stop) {
                    break;
                }
            }

            Ok(())
        })
    }
}

/// Time between records. A rate of zero or less means "as fast as
/// possible"; a rate too small to give a representable period is clamped to
/// the longest one.
fn record_period(record_rate: f64) -> Duration {
    if record_rate > 0.0 {
        Duration::try_from_secs_f64(record_rate.recip()).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}

/// Splits the front of `outgoing` into random chunks of `1..=max_chunk`
/// bytes. Unless `flush` is set, a remainder shorter than the chosen chunk
/// size is left in place.
fn take_chunks(
    outgoing: &mut Vec<u8>,
    max_chunk: usize,
    flush: bool,
    rng: &mut impl Rng,
) -> Vec<Vec<u8>> {
    let mut chunks = Vec::new();
    loop {
        let size = rng.gen_range(1..=max_chunk);
        if outgoing.len() < size {
            if flush && !outgoing.is_empty() {
                chunks.push(std::mem::take(outgoing));
            }
            return chunks;
        }
        chunks.push(outgoing.drain(..size).collect());
    }
}

/// The state of the simulated sleeper.
#[derive(Debug)]
struct Wearer {
    position: usize,
}

impl Default for Wearer {
    fn default() -> Self {
        Self {
            position: HeadPosition::ALL.len() / 2,
        }
    }
}

impl Wearer {
    fn next_record(&mut self, rng: &mut impl Rng, time: &str) -> String {
        // Heads mostly stay put, and otherwise roll one step at a time
        let last = HeadPosition::ALL.len() - 1;
        self.position = match rng.gen_range(0..10) {
            0 => self.position.saturating_sub(1),
            1 => (self.position + 1).min(last),
            _ => self.position,
        };

        format!(
            "{},{},{:.2},{:.1},{},{}\r\n",
            time,
            rng.gen_range(55..=95),
            rng.gen_range(0.90..=1.00),
            rng.gen_range(36.0..=37.5),
            HeadPosition::ALL[self.position].label(),
            u8::from(rng.gen_bool(0.2)),
        )
    }
}
