//! The byte-stream side of the dashboard.
//!
//! A [`Link`] owns a background thread that reads from some source and
//! forwards whatever it gets as [`LinkEvent`]s over a channel. The link knows
//! nothing about records; it hands over raw chunks with arbitrary boundaries
//! and the [`Session`](crate::session::Session) does the rest.

use log::{error, info, warn};
use serial2::SerialPort;

use std::{
    fmt,
    io::{self, Read},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, Sender},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

/// How long a serial read may block before the stop flag is checked again.
const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Something that happened on a link, in the order it happened.
#[derive(Debug)]
pub enum LinkEvent {
    /// The link is up; carries a human readable device name.
    Connected(String),
    /// Raw bytes, with no guarantee about where records start or end.
    Chunk(Vec<u8>),
    /// The link is gone. Nothing follows this event.
    Disconnected,
    /// The link failed. A [`LinkEvent::Disconnected`] follows.
    Error(TransportError),
}

/// Why a link could not be opened or stopped delivering.
#[derive(Debug)]
pub enum TransportError {
    /// The device could not be opened or configured.
    Open {
        /// The device that was asked for.
        path: PathBuf,
        /// What the OS said about it.
        source: io::Error,
    },
    /// Reading from an open device failed.
    Read(io::Error),
    /// There is nothing to connect to.
    NoPorts,
    /// Port enumeration failed.
    Enumerate(io::Error),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Open { path, source } => {
                write!(f, "could not open {}: {}", path.display(), source)
            }
            TransportError::Read(error) => write!(f, "read failed: {}", error),
            TransportError::NoPorts => write!(f, "no serial devices found"),
            TransportError::Enumerate(error) => {
                write!(f, "could not list serial devices: {}", error)
            }
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Open { source, .. } => Some(source),
            TransportError::Read(error) | TransportError::Enumerate(error) => Some(error),
            TransportError::NoPorts => None,
        }
    }
}

/// A running source of [`LinkEvent`]s.
///
/// Disconnecting never waits on the reader thread. A thread stuck in a
/// blocking read is left to notice the stop flag, or the closed channel, on
/// its own time, and everything it sends from then on is discarded.
pub struct Link {
    name: String,
    events: Receiver<LinkEvent>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Link {
    /// Runs `body` on its own thread. `body` should push chunks into the
    /// sender until it runs out of data, fails, or sees the stop flag set.
    /// [`LinkEvent::Connected`] is sent before `body` runs and
    /// [`LinkEvent::Disconnected`] after it returns, whatever the outcome.
    pub fn spawn<F>(name: impl Into<String>, body: F) -> Self
    where
        F: FnOnce(&Sender<LinkEvent>, &AtomicBool) -> Result<(), TransportError> + Send + 'static,
    {
        let name = name.into();
        let (tx, events) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let th_stop = Arc::clone(&stop);
        let th_name = name.clone();

        let handle = thread::spawn(move || {
            // If the receiving end is gone there is nobody left to tell
            let _ = tx.send(LinkEvent::Connected(th_name.clone()));

            if let Err(e) = body(&tx, &th_stop) {
                error!("{} : {}", th_name, e);
                let _ = tx.send(LinkEvent::Error(e));
            }

            info!("{} : disconnected.", th_name);
            let _ = tx.send(LinkEvent::Disconnected);
        });

        Link {
            name,
            events,
            stop,
            handle: Some(handle),
        }
    }

    /// The device name given at spawn time.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The consuming end of the link.
    pub fn events(&self) -> &Receiver<LinkEvent> {
        &self.events
    }

    /// Asks the reader thread to stop and returns straight away. Events
    /// already queued stay readable through [`Link::events`]; the final
    /// [`LinkEvent::Disconnected`] shows up there once the thread gets round
    /// to exiting.
    pub fn disconnect(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.handle.take() {
            if thread.is_finished() && thread.join().is_err() {
                warn!("{} : reader thread panicked.", self.name);
            }
        }
    }
}

/// Sleeps for `period`, waking every [`READ_TIMEOUT`] to look at `stop`.
/// Returns `false` if the sleep was cut short.
pub(crate) fn pause(period: Duration, stop: &AtomicBool) -> bool {
    // Too far out to name an instant for; sleep until stopped
    let deadline = Instant::now().checked_add(period);
    loop {
        if stop.load(Ordering::Relaxed) {
            return false;
        }
        let remaining = match deadline {
            Some(deadline) => deadline.saturating_duration_since(Instant::now()),
            None => READ_TIMEOUT,
        };
        if remaining.is_zero() {
            return true;
        }
        spin_sleep::sleep(remaining.min(READ_TIMEOUT));
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("name", &self.name)
            .field("running", &self.handle.is_some())
            .finish()
    }
}

/// Lists the serial devices a link could be opened on.
pub fn available_ports() -> Result<Vec<PathBuf>, TransportError> {
    let ports = SerialPort::available_ports().map_err(TransportError::Enumerate)?;
    if ports.is_empty() {
        return Err(TransportError::NoPorts);
    }
    Ok(ports)
}

/// Opens the serial device at `path` and starts streaming from it.
pub fn serial_link(path: impl AsRef<Path>, baud_rate: u32) -> Result<Link, TransportError> {
    let path = path.as_ref();
    let open_error = |source| TransportError::Open {
        path: path.to_owned(),
        source,
    };

    let mut port = SerialPort::open(path, baud_rate).map_err(open_error)?;
    port.set_read_timeout(READ_TIMEOUT).map_err(open_error)?;
    info!("Opened {} at {} baud", path.display(), baud_rate);

    Ok(Link::spawn(path.display().to_string(), move |tx, stop| {
        let mut buffer = [0; 256];

        while !stop.load(Ordering::Relaxed) {
            match port.read(&mut buffer) {
                // The device went away underneath us
                Ok(0) => return Ok(()),
                Ok(read_len) => {
                    if tx.send(LinkEvent::Chunk(buffer[..read_len].to_vec())).is_err() {
                        return Ok(());
                    }
                }
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::TimedOut
                            | io::ErrorKind::WouldBlock
                            | io::ErrorKind::Interrupted
                    ) =>
                {
                    continue
                }
                Err(e) => return Err(TransportError::Read(e)),
            }
        }

        Ok(())
    }))
}

/// Streams `reader` (a capture file, stdin, ...) in chunks of at most
/// `chunk_size` bytes, pausing `interval` between chunks. The link closes at
/// end of input.
pub fn replay_link<R>(
    name: impl Into<String>,
    mut reader: R,
    chunk_size: usize,
    interval: Duration,
) -> Link
where
    R: Read + Send + 'static,
{
    let chunk_size = chunk_size.max(1);

    Link::spawn(name, move |tx, stop| {
        let mut buffer = vec![0; chunk_size];

        while !stop.load(Ordering::Relaxed) {
            let read_len = match reader.read(&mut buffer) {
                Ok(0) => return Ok(()),
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(TransportError::Read(e)),
            };

            if tx.send(LinkEvent::Chunk(buffer[..read_len].to_vec())).is_err() {
                return Ok(());
            }
            if !interval.is_zero() && !pause(interval, stop) {
                break;
            }
        }

        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn collect(link: &Link) -> Vec<LinkEvent> {
        link.events().iter().collect()
    }

    #[test]
    fn replay_delivers_everything_in_order() {
        let text = "10:00,72,0.98,36.6,Medium Left,0\n10:01,73\n";
        let link = replay_link("capture", Cursor::new(text), 7, Duration::ZERO);

        let events = collect(&link);

        assert!(matches!(events.first(), Some(LinkEvent::Connected(name)) if name == "capture"));
        assert!(matches!(events.last(), Some(LinkEvent::Disconnected)));

        let bytes: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                LinkEvent::Chunk(c) => Some(c.clone()),
                _ => None,
            })
            .inspect(|c| assert!(!c.is_empty() && c.len() <= 7))
            .flatten()
            .collect();
        assert_eq!(bytes, text.as_bytes());
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"))
        }
    }

    #[test]
    fn read_errors_are_reported_then_disconnect() {
        let link = replay_link("broken", FailingReader, 8, Duration::ZERO);

        let events = collect(&link);

        assert_eq!(events.len(), 3);
        assert!(matches!(events[1], LinkEvent::Error(TransportError::Read(_))));
        assert!(matches!(events[2], LinkEvent::Disconnected));
    }

    #[test]
    fn disconnect_stops_an_endless_source() {
        let mut link = replay_link("zeros", io::repeat(b'0'), 16, Duration::from_millis(1));
        link.disconnect();

        let events = collect(&link);
        assert!(matches!(events.last(), Some(LinkEvent::Disconnected)));
    }

    /// Blocks for a long time on every read, like an idle pipe.
    struct StalledReader(Duration);

    impl Read for StalledReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            thread::sleep(self.0);
            buf[0] = b'0';
            Ok(1)
        }
    }

    #[test]
    fn disconnect_does_not_wait_for_a_blocked_read() {
        let mut link = replay_link(
            "stalled",
            StalledReader(Duration::from_secs(3)),
            8,
            Duration::ZERO,
        );

        let started = Instant::now();
        link.disconnect();
        assert!(started.elapsed() < Duration::from_millis(500));

        let started = Instant::now();
        drop(link);
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn disconnect_cuts_a_long_interval_short() {
        let mut link = replay_link("slow", io::repeat(b'0'), 4, Duration::from_secs(30));
        let first = link.events().recv_timeout(Duration::from_secs(2));
        assert!(matches!(first, Ok(LinkEvent::Connected(_))));

        link.disconnect();
        let started = Instant::now();
        let events: Vec<LinkEvent> = link.events().iter().collect();

        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(matches!(events.last(), Some(LinkEvent::Disconnected)));
    }

    #[test]
    fn pause_returns_early_once_stopped() {
        let stop = AtomicBool::new(false);
        assert!(pause(Duration::from_millis(5), &stop));

        stop.store(true, Ordering::Relaxed);
        let started = Instant::now();
        assert!(!pause(Duration::from_secs(10), &stop));
        assert!(!pause(Duration::MAX, &stop));
        assert!(started.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn opening_a_missing_device_fails() {
        let res = serial_link("/dev/definitely-not-a-sensor", 115200);
        assert!(matches!(res, Err(TransportError::Open { .. })));
    }
}
