//! The head-orientation vocabulary reported by the wearable, and the
//! discrete indicator the dashboard draws from it.

use std::fmt;

/// One of the five orientations the IMU classifier can report, ordered from
/// the wearer's far left to far right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HeadPosition {
    /// Head turned fully to the left
    ExtremeLeft,
    /// Head turned partway to the left
    MediumLeft,
    /// Face up, the neutral position
    RelativelyUp,
    /// Head turned partway to the right
    MediumRight,
    /// Head turned fully to the right
    ExtremeRight,
}

impl HeadPosition {
    /// Every position, left to right.
    pub const ALL: [HeadPosition; 5] = [
        HeadPosition::ExtremeLeft,
        HeadPosition::MediumLeft,
        HeadPosition::RelativelyUp,
        HeadPosition::MediumRight,
        HeadPosition::ExtremeRight,
    ];

    /// The canonical label, exactly as it appears on the wire once
    /// normalized.
    pub fn label(self) -> &'static str {
        match self {
            HeadPosition::ExtremeLeft => "Extreme Left",
            HeadPosition::MediumLeft => "Medium Left",
            HeadPosition::RelativelyUp => "Relatively Up",
            HeadPosition::MediumRight => "Medium Right",
            HeadPosition::ExtremeRight => "Extreme Right",
        }
    }

    /// Rotation of the head indicator, in degrees. Negative is left.
    pub fn angle_degrees(self) -> f64 {
        match self {
            HeadPosition::ExtremeLeft => -45.0,
            HeadPosition::MediumLeft => -22.5,
            HeadPosition::RelativelyUp => 0.0,
            HeadPosition::MediumRight => 22.5,
            HeadPosition::ExtremeRight => 45.0,
        }
    }

    /// Looks up an already normalized label.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.label() == label)
    }
}

impl fmt::Display for HeadPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Title-cases a raw head position string: lowercase everything, then
/// capitalize the first letter of every space separated word.
///
/// Runs of spaces are kept as they are, so `"medium  left"` does not
/// collapse into a recognized label.
pub fn normalize_label(raw: &str) -> String {
    raw.to_lowercase()
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// The discrete head-position display: the most recent label plus the
/// position it maps to, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadIndicator {
    label: String,
    position: Option<HeadPosition>,
}

impl Default for HeadIndicator {
    fn default() -> Self {
        Self::neutral()
    }
}

impl HeadIndicator {
    /// The indicator at rest, facing up.
    pub fn neutral() -> Self {
        Self {
            label: HeadPosition::RelativelyUp.label().to_owned(),
            position: Some(HeadPosition::RelativelyUp),
        }
    }

    /// Moves the indicator to `label`, which is normalized first. Labels
    /// outside the vocabulary are kept for display but carry no position.
    pub fn update(&mut self, label: &str) {
        let label = normalize_label(label);
        self.position = HeadPosition::from_label(&label);
        self.label = label;
    }

    /// Returns to [`HeadIndicator::neutral`].
    pub fn reset(&mut self) {
        *self = Self::neutral();
    }

    /// Text shown next to the indicator.
    pub fn label(&self) -> &str {
        if self.label.is_empty() {
            "Unknown"
        } else {
            &self.label
        }
    }

    /// The recognized position, if the last label was in the vocabulary.
    pub fn position(&self) -> Option<HeadPosition> {
        self.position
    }

    /// Rotation in degrees; unrecognized labels sit in the center.
    pub fn angle_degrees(&self) -> f64 {
        self.position.map_or(0.0, HeadPosition::angle_degrees)
    }
}
