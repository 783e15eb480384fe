//! Producer/consumer plumbing between sample sources and the statistics
//! engine.

mod channel;

pub use channel::AcquisitionChannel;
