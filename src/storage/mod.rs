//! Card storage for Quickfire.
//!
//! This module provides card sources, result persistence and the
//! background recorder that keeps persistence off the session thread.

pub mod file;
pub mod memory;
pub mod recorder;
pub mod traits;

pub use file::FileCardStore;
pub use memory::MemoryCardStore;
pub use recorder::BackgroundRecorder;
pub use traits::{CardSource, PersistenceAdapter, ResultRecord, ResultSink};
