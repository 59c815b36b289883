//! Campaign reporting: multi-touch attribution and channel revenue rollups.

pub mod attribution;
pub mod revenue;

pub use attribution::{attribute, ChannelCredits};
pub use revenue::{ChannelAttribution, ChannelReport, ConversionPath, RevenueAttributionEngine};
