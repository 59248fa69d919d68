//! SenseDash is the host-side half of a sleep monitoring wearable. The
//! wearable streams one comma separated line per reading (heart rate, SpO2,
//! skin temperature, head position and a snoring flag) over a BLE UART
//! bridge. SenseDash turns that stream back into records, keeps a rolling
//! window of each vital sign for live charts, tracks which way the wearer's
//! head is turned, and keeps every reading so the session can be exported as
//! a CSV table.
//!
//! The pipeline, leaves first:
//!
//! - [`line_reassembler`] splits the chunked byte stream into lines
//! - [`record`] parses a line into a [`record::Sample`]
//! - [`rolling_window`] and [`window_store`] keep the bounded chart data
//! - [`sample_log`] keeps everything, for [`export`]
//! - [`session`] owns all of the above and is driven by [`transport`] events
//!
//! The terminal dashboard in [`gui`] is one consumer of a session; the
//! `monitor` binary is another.

#![warn(missing_docs)]
pub mod args;
pub mod config;
pub mod dummy_source;
pub mod export;
pub mod gui;
pub mod head_position;
pub mod line_reassembler;
pub mod record;
pub mod rolling_window;
pub mod sample_log;
pub mod session;
pub mod transport;
pub mod window_store;
