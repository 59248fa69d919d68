//! A capacity-bounded series of chart points.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default number of points a window holds.
pub const DEFAULT_CAPACITY: usize = 50;

/// Label given to the synthetic point produced by [`EvictionPolicy::Compress`].
pub const AVERAGE_LABEL: &str = "Avg";

/// What a [`RollingWindow`] does once it runs out of room. A deployment picks
/// one and every channel uses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EvictionPolicy {
    /// Drop the oldest point once the window is over capacity.
    #[default]
    Shift,
    /// Once the window is full, collapse it into a single point holding the
    /// mean of everything in it.
    Compress,
}

/// A single chart point. `None` means the device sent nothing usable.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    /// Where on the x axis the point sits, usually a timestamp.
    pub label: String,
    /// The reading, if there was a usable one.
    pub value: Option<f64>,
}

/// The points currently shown on one chart, oldest first, never more than
/// the window's capacity.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    points: VecDeque<Point>,
    capacity: usize,
    policy: EvictionPolicy,
}

impl RollingWindow {
    /// Instantiates an empty window. A capacity of zero is treated as one.
    pub fn new(capacity: usize, policy: EvictionPolicy) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity + 1),
            capacity,
            policy,
        }
    }

    /// Appends a point, then applies the eviction policy.
    pub fn push(&mut self, label: impl Into<String>, value: Option<f64>) {
        self.points.push_back(Point {
            label: label.into(),
            value,
        });

        match self.policy {
            EvictionPolicy::Shift => {
                while self.points.len() > self.capacity {
                    self.points.pop_front();
                }
            }
            EvictionPolicy::Compress => {
                if self.points.len() >= self.capacity {
                    let average = self.mean();
                    self.points.clear();
                    self.points.push_back(Point {
                        label: AVERAGE_LABEL.to_owned(),
                        value: average,
                    });
                }
            }
        }
    }

    /// Arithmetic mean of the values that are present and not NaN, or `None`
    /// if there are none.
    pub fn mean(&self) -> Option<f64> {
        let (sum, n) = self
            .points
            .iter()
            .filter_map(|p| p.value)
            .filter(|v| !v.is_nan())
            .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));

        (n > 0).then(|| sum / n as f64)
    }

    /// The most recent point.
    pub fn latest(&self) -> Option<&Point> {
        self.points.back()
    }

    /// Every point held, oldest first.
    pub fn points(&self) -> impl ExactSizeIterator<Item = &Point> + '_ {
        self.points.iter()
    }

    /// Number of points held.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether no points are held.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The eviction policy in effect.
    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    /// Drops every point.
    pub fn clear(&mut self) {
        self.points.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(window: &RollingWindow) -> Vec<String> {
        window.points().map(|p| p.label.clone()).collect()
    }

    #[test]
    fn shift_keeps_the_newest_points() {
        let mut window = RollingWindow::new(50, EvictionPolicy::Shift);
        for i in 0..51 {
            window.push(i.to_string(), Some(i as f64));
        }

        assert_eq!(window.len(), 50);
        let expected: Vec<String> = (1..51).map(|i: i32| i.to_string()).collect();
        assert_eq!(labels(&window), expected);
    }

    #[test]
    fn shift_under_capacity_keeps_everything() {
        let mut window = RollingWindow::new(50, EvictionPolicy::Shift);
        for i in 0..50 {
            window.push(i.to_string(), None);
        }
        assert_eq!(window.len(), 50);
        assert_eq!(window.points().next().unwrap().label, "0");
    }

    #[test]
    fn compress_collapses_to_the_mean() {
        let mut window = RollingWindow::new(50, EvictionPolicy::Compress);
        let mut sum = 0.0;
        let mut n = 0;
        for i in 0..50 {
            // every fifth value is missing and must not drag the mean down
            let value = (i % 5 != 0).then_some(60.0 + i as f64);
            if let Some(v) = value {
                sum += v;
                n += 1;
            }
            window.push(format!("t{i}"), value);
        }

        assert_eq!(window.len(), 1);
        let point = window.latest().unwrap();
        assert_eq!(point.label, AVERAGE_LABEL);
        assert!((point.value.unwrap() - sum / n as f64).abs() < 1e-9);
    }

    #[test]
    fn compress_below_capacity_does_nothing() {
        let mut window = RollingWindow::new(50, EvictionPolicy::Compress);
        for i in 0..49 {
            window.push(i.to_string(), Some(1.0));
        }
        assert_eq!(window.len(), 49);
    }

    #[test]
    fn compress_keeps_rolling_after_collapse() {
        let mut window = RollingWindow::new(3, EvictionPolicy::Compress);
        window.push("a", Some(1.0));
        window.push("b", Some(2.0));
        window.push("c", Some(3.0));
        assert_eq!(labels(&window), vec!["Avg"]);

        window.push("d", Some(6.0));
        assert_eq!(labels(&window), vec!["Avg", "d"]);
        window.push("e", Some(7.0));
        assert_eq!(window.latest().unwrap().value, Some(5.0));
    }

    #[test]
    fn compress_of_nothing_is_null() {
        let mut window = RollingWindow::new(3, EvictionPolicy::Compress);
        window.push("a", None);
        window.push("b", Some(f64::NAN));
        window.push("c", None);

        assert_eq!(window.len(), 1);
        assert_eq!(window.latest().unwrap().value, None);
    }

    #[test]
    fn mean_skips_nan() {
        let mut window = RollingWindow::new(10, EvictionPolicy::Shift);
        window.push("a", Some(f64::NAN));
        window.push("b", Some(4.0));
        window.push("c", None);
        window.push("d", Some(2.0));
        assert_eq!(window.mean(), Some(3.0));
    }

    #[test]
    fn zero_capacity_holds_one_point() {
        let mut window = RollingWindow::new(0, EvictionPolicy::Shift);
        window.push("a", Some(1.0));
        window.push("b", Some(2.0));
        assert_eq!(labels(&window), vec!["b"]);
    }
}
