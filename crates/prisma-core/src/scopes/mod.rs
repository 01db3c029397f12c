//! Scope computation.

pub mod histogram;

pub use histogram::{Channel, ChannelStats, Histogram, HistogramStats};
