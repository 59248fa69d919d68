//! One [`RollingWindow`] per numeric channel, plus the head-position
//! indicator, and the [`PresentationSink`] that gets told about changes.

use crate::head_position::HeadIndicator;
use crate::record::Sample;
use crate::rolling_window::{EvictionPolicy, RollingWindow};

use std::fmt;

/// A named metric on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Beats per minute.
    HeartRate,
    /// Blood oxygen saturation.
    Spo2,
    /// Skin temperature.
    Temperature,
    /// Whether the wearer is snoring.
    Snoring,
    /// Which way the head is turned. Not charted.
    HeadPosition,
}

impl Channel {
    /// The channels backed by a numeric [`RollingWindow`], in display order.
    pub const NUMERIC: [Channel; 4] = [
        Channel::HeartRate,
        Channel::Spo2,
        Channel::Temperature,
        Channel::Snoring,
    ];

    /// Chart title.
    pub fn title(self) -> &'static str {
        match self {
            Channel::HeartRate => "Heart Rate",
            Channel::Spo2 => "SpO2",
            Channel::Temperature => "Temperature",
            Channel::Snoring => "Snoring",
            Channel::HeadPosition => "Head Position",
        }
    }

    fn slot(self) -> Option<usize> {
        Channel::NUMERIC.iter().position(|&c| c == self)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Whatever draws the dashboard. Every method has an empty default so a sink
/// only needs to care about what it renders.
pub trait PresentationSink {
    /// `window` changed and should be redrawn, without animation.
    fn redraw(&mut self, _channel: Channel, _window: &RollingWindow) {}

    /// The head indicator moved.
    fn head_moved(&mut self, _indicator: &HeadIndicator) {}

    /// A sample was appended to the log.
    fn row_appended(&mut self, _sample: &Sample) {}

    /// A line worth showing in the activity panel.
    fn activity(&mut self, _line: &str) {}

    /// The link status changed.
    fn status(&mut self, _status: &str) {}

    /// All data was wiped.
    fn cleared(&mut self) {}
}

/// A sink that ignores everything, for headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl PresentationSink for NullSink {}

/// Numeric interpretation of a vital sign field. Anything that is not a
/// finite, non-zero number counts as missing.
pub fn vital_value(field: &str) -> Option<f64> {
    field
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v != 0.0)
}

/// Numeric interpretation of the snoring field. Anything that is not a
/// finite number counts as not snoring.
pub fn snoring_value(field: &str) -> f64 {
    field
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Chart data for every numeric [`Channel`] plus the head indicator.
#[derive(Debug, Clone)]
pub struct WindowStore {
    windows: [RollingWindow; 4],
    head: HeadIndicator,
}

impl WindowStore {
    /// Instantiates a store where every channel shares `capacity` and
    /// `policy`.
    pub fn new(capacity: usize, policy: EvictionPolicy) -> Self {
        Self {
            windows: std::array::from_fn(|_| RollingWindow::new(capacity, policy)),
            head: HeadIndicator::neutral(),
        }
    }

    /// Pushes one point onto a numeric channel and asks the sink to redraw
    /// it. Pushing to [`Channel::HeadPosition`] is ignored, use
    /// [`WindowStore::move_head`].
    pub fn push(
        &mut self,
        channel: Channel,
        label: &str,
        value: Option<f64>,
        sink: &mut impl PresentationSink,
    ) {
        let Some(slot) = channel.slot() else {
            return;
        };
        let window = &mut self.windows[slot];
        window.push(label, value);
        sink.redraw(channel, window);
    }

    /// Moves the head indicator to `label`.
    pub fn move_head(&mut self, label: &str, sink: &mut impl PresentationSink) {
        self.head.update(label);
        sink.head_moved(&self.head);
    }

    /// Fans a sample out to every channel.
    pub fn apply(&mut self, sample: &Sample, sink: &mut impl PresentationSink) {
        let label = sample.time();
        self.push(
            Channel::HeartRate,
            label,
            vital_value(sample.heart_rate()),
            sink,
        );
        self.push(Channel::Spo2, label, vital_value(sample.spo2()), sink);
        self.push(
            Channel::Temperature,
            label,
            vital_value(sample.temperature()),
            sink,
        );
        self.move_head(sample.head_position(), sink);
        self.push(
            Channel::Snoring,
            label,
            Some(snoring_value(sample.snoring())),
            sink,
        );
    }

    /// The window behind a numeric channel, `None` for the head position.
    pub fn window(&self, channel: Channel) -> Option<&RollingWindow> {
        channel.slot().map(|slot| &self.windows[slot])
    }

    /// The head-position indicator.
    pub fn head(&self) -> &HeadIndicator {
        &self.head
    }

    /// Empties every window and recenters the head indicator.
    pub fn clear(&mut self) {
        for window in self.windows.iter_mut() {
            window.clear();
        }
        self.head.reset();
    }
}
