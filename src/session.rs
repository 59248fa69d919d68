//! The one place where dashboard state lives.
//!
//! A [`Session`] owns the reassembly buffer, the chart windows, the sample log
//! and the link status, and is driven one [`LinkEvent`] at a time. Each event
//! is processed to completion before the next is looked at, so samples reach
//! the charts and the log in exactly the order their bytes arrived.

use crate::config::DashConfig;
use crate::export::{self, ExportError};
use crate::line_reassembler::LineReassembler;
use crate::record::Sample;
use crate::sample_log::SampleLog;
use crate::transport::LinkEvent;
use crate::window_store::{PresentationSink, WindowStore};

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use std::{
    path::{Path, PathBuf},
    sync::mpsc::{Receiver, TryRecvError},
};

/// Status line text before anything has happened.
pub const IDLE_STATUS: &str = "Not connected";

/// Owns everything received over one or more links and reports every change
/// to its sink `S`.
pub struct Session<S: PresentationSink> {
    reassembler: LineReassembler,
    store: WindowStore,
    log: SampleLog,
    status: String,
    connected: bool,
    dropped: usize,
    sink: S,
}

impl<S: PresentationSink> Session<S> {
    /// Instantiates an empty session that reports to `sink`.
    pub fn new(config: &DashConfig, sink: S) -> Self {
        let mut session = Self {
            reassembler: LineReassembler::new(),
            store: WindowStore::new(config.capacity, config.policy),
            log: SampleLog::new(),
            status: String::new(),
            connected: false,
            dropped: 0,
            sink,
        };
        session.set_status(IDLE_STATUS);
        session
    }

    /// Reacts to one event from the link.
    pub fn handle(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::Connected(name) => {
                info!("Connected to {}", name);
                self.connected = true;
                self.set_status(&format!("Connected to {}", name));
                self.sink.activity("[link] connected");
            }
            LinkEvent::Chunk(chunk) => self.feed(&chunk),
            LinkEvent::Disconnected => {
                // Only the link goes away; everything received so far stays
                self.connected = false;
                if !self.status.starts_with("Error") {
                    self.set_status("Disconnected");
                }
                self.sink.activity("[link] disconnected");
            }
            LinkEvent::Error(e) => {
                error!("Link error: {}", e);
                self.report_error(&e);
            }
        }
    }

    /// Surfaces a transport failure on the status line. Nothing is retried.
    pub fn report_error(&mut self, e: &dyn std::error::Error) {
        self.set_status(&format!("Error: {}", e));
        self.sink.activity(&format!("[err] {}", e));
    }

    /// Runs a raw chunk through the pipeline.
    pub fn feed(&mut self, chunk: &[u8]) {
        for record in self.reassembler.feed(chunk) {
            match Sample::parse_bytes(&record) {
                Ok(sample) => self.accept(&record, sample),
                Err(e) => {
                    self.dropped += 1;
                    debug!(
                        "Dropping record {:?}: {}",
                        String::from_utf8_lossy(&record),
                        e
                    );
                }
            }
        }
    }

    fn accept(&mut self, record: &[u8], sample: Sample) {
        // The line as it came off the wire, before any defaults or cleanup
        self.sink.activity(&String::from_utf8_lossy(record));
        self.store.apply(&sample, &mut self.sink);
        self.sink.row_appended(&sample);
        self.log.append(sample);
    }

    /// Processes every event already waiting on `events` without blocking.
    /// Returns `false` once the link has said it is done.
    pub fn drain(&mut self, events: &Receiver<LinkEvent>) -> bool {
        loop {
            match events.try_recv() {
                Ok(LinkEvent::Disconnected) => {
                    self.handle(LinkEvent::Disconnected);
                    return false;
                }
                Ok(event) => self.handle(event),
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => {
                    if self.connected {
                        warn!("Link went away without saying goodbye");
                        self.handle(LinkEvent::Disconnected);
                    }
                    return false;
                }
            }
        }
    }

    /// Wipes every chart, the log, the head indicator and any half received
    /// record. The link, if any, stays up.
    pub fn clear(&mut self) {
        self.reassembler.clear();
        self.store.clear();
        self.log.clear();
        self.dropped = 0;
        self.sink.cleared();
        info!("Session cleared");
    }

    /// Writes the log to a new table in `dir`. Returns `Ok(None)` without
    /// touching the disk when there is nothing to export.
    pub fn export(
        &mut self,
        dir: impl AsRef<Path>,
        now: DateTime<Utc>,
    ) -> Result<Option<PathBuf>, ExportError> {
        let res = export::export_to_dir(&self.log, dir, now);
        match &res {
            Ok(Some(path)) => self
                .sink
                .activity(&format!("[export] {}", path.display())),
            Ok(None) => self.sink.activity("[export] nothing to export"),
            Err(e) => {
                error!("Export failed: {}", e);
                self.sink.activity(&format!("[err] export failed: {}", e));
            }
        }
        res
    }

    fn set_status(&mut self, status: &str) {
        self.status = status.to_owned();
        self.sink.status(status);
    }

    /// The current status line.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Whether a link has connected and not yet gone away.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Records rejected by the parser since the last clear.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// The chart windows and head indicator.
    pub fn store(&self) -> &WindowStore {
        &self.store
    }

    /// Every sample accepted since the last clear.
    pub fn log(&self) -> &SampleLog {
        &self.log
    }

    /// The sink the session reports to.
    pub fn sink(&self) -> &S {
        &self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::head_position::{HeadIndicator, HeadPosition};
    use crate::rolling_window::{EvictionPolicy, RollingWindow};
    use crate::transport::TransportError;
    use crate::window_store::{Channel, NullSink};
    use std::io;
    use std::sync::mpsc::channel;

    #[derive(Default)]
    struct RecordingSink {
        events: Vec<String>,
        activity: Vec<String>,
    }

    impl PresentationSink for RecordingSink {
        fn redraw(&mut self, channel: Channel, window: &RollingWindow) {
            self.events.push(format!("redraw {} {}", channel, window.len()));
        }

        fn head_moved(&mut self, indicator: &HeadIndicator) {
            self.events.push(format!("head {}", indicator.label()));
        }

        fn row_appended(&mut self, sample: &Sample) {
            self.events.push(format!("row {}", sample.time()));
        }

        fn cleared(&mut self) {
            self.events.push("cleared".to_owned());
        }

        fn activity(&mut self, line: &str) {
            self.activity.push(line.to_owned());
        }
    }

    fn session() -> Session<NullSink> {
        Session::new(&DashConfig::default(), NullSink)
    }

    #[test]
    fn chunks_become_samples() {
        let mut session = session();
        session.feed(b"10:00,72,0.98,36.6,Medium Left,0\r\n10:01,7");
        session.feed(b"3,0.97,36.7,extreme left,1\r\n");

        let log = session.log().snapshot();
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].heart_rate(), "73");
        assert_eq!(log[1].head_position(), "Extreme Left");

        let hr = session.store().window(Channel::HeartRate).unwrap();
        assert_eq!(hr.len(), 2);
        assert_eq!(
            session.store().head().position(),
            Some(HeadPosition::ExtremeLeft)
        );
    }

    #[test]
    fn bad_records_are_dropped_and_the_stream_carries_on() {
        let mut session = session();
        session.feed(b"\xFF\xFE,72\n\n   \n10:00,72\n");

        assert_eq!(session.dropped(), 1);
        assert_eq!(session.log().len(), 1);
        assert_eq!(session.log().snapshot()[0].time(), "10:00");
    }

    #[test]
    fn sink_sees_updates_in_order() {
        let mut session = Session::new(&DashConfig::default(), RecordingSink::default());
        session.feed(b"10:00,72,0.98,36.6,medium right,0\n");
        session.clear();

        assert_eq!(
            session.sink().events,
            vec![
                "redraw Heart Rate 1",
                "redraw SpO2 1",
                "redraw Temperature 1",
                "head Medium Right",
                "redraw Snoring 1",
                "row 10:00",
                "cleared",
            ]
        );
    }

    #[test]
    fn activity_shows_records_as_received() {
        let mut session = Session::new(&DashConfig::default(), RecordingSink::default());
        session.feed(b"  10:00,72\r\n10:01,70,0.97,36.5,medium right,0\n");

        assert_eq!(
            session.sink().activity,
            vec!["10:00,72", "10:01,70,0.97,36.5,medium right,0"]
        );
        assert_eq!(session.log().snapshot()[1].head_position(), "Medium Right");
    }

    #[test]
    fn clear_before_anything_arrived() {
        let mut session = session();
        session.clear();
        assert!(session.log().is_empty());
        assert_eq!(session.store().head(), &HeadIndicator::neutral());
    }

    #[test]
    fn clear_wipes_everything() {
        let mut session = session();
        session.feed(b"10:00,72,0.98,36.6,Extreme Right,1\n10:01,7");
        session.clear();

        assert!(session.log().is_empty());
        for channel in Channel::NUMERIC {
            assert!(session.store().window(channel).unwrap().is_empty());
        }
        assert_eq!(session.store().head(), &HeadIndicator::neutral());

        // the half record from before the clear must not resurface
        session.feed(b"3,x\n");
        assert_eq!(session.log().snapshot()[0].time(), "3");
    }

    #[test]
    fn disconnect_keeps_data() {
        let mut session = session();
        session.handle(LinkEvent::Connected("wearable".to_owned()));
        assert!(session.is_connected());
        assert_eq!(session.status(), "Connected to wearable");

        session.handle(LinkEvent::Chunk(b"10:00,72\n".to_vec()));
        session.handle(LinkEvent::Disconnected);

        assert!(!session.is_connected());
        assert_eq!(session.status(), "Disconnected");
        assert_eq!(session.log().len(), 1);
        assert_eq!(
            session.store().window(Channel::HeartRate).unwrap().len(),
            1
        );
    }

    #[test]
    fn errors_stay_on_the_status_line() {
        let mut session = session();
        session.handle(LinkEvent::Error(TransportError::Read(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "unplugged",
        ))));
        session.handle(LinkEvent::Disconnected);

        assert!(session.status().starts_with("Error: read failed"));
    }

    #[test]
    fn drain_stops_at_disconnect() {
        let mut session = session();
        let (tx, rx) = channel();
        tx.send(LinkEvent::Connected("x".to_owned())).unwrap();
        tx.send(LinkEvent::Chunk(b"1,2\n3,".to_vec())).unwrap();
        tx.send(LinkEvent::Chunk(b"4\n".to_vec())).unwrap();

        assert!(session.drain(&rx));
        assert_eq!(session.log().len(), 2);

        tx.send(LinkEvent::Disconnected).unwrap();
        assert!(!session.drain(&rx));
    }

    #[test]
    fn compress_policy_from_config() {
        let config = DashConfig {
            capacity: 4,
            policy: EvictionPolicy::Compress,
            ..DashConfig::default()
        };
        let mut session = Session::new(&config, NullSink);
        session.feed(b"a,10\nb,20\nc,\nd,30\n");

        let hr = session.store().window(Channel::HeartRate).unwrap();
        assert_eq!(hr.len(), 1);
        assert_eq!(hr.latest().unwrap().value, Some(20.0));
        assert_eq!(session.log().len(), 4);
    }

    #[test]
    fn export_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session();

        assert!(session.export(dir.path(), Utc::now()).unwrap().is_none());

        session.feed(b"10:00,72,0.98,36.6,Medium Left,0\n10:01,,,,,\n");
        let path = session.export(dir.path(), Utc::now()).unwrap().unwrap();

        assert_eq!(export::from_path(path).unwrap(), session.log().snapshot());
    }
}
