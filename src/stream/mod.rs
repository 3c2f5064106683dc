// src/stream/mod.rs

//! Stream plumbing shared by process handles.
//!
//! - [`event`]: single-shot named events (`wait_for_event`).
//! - [`combine`]: fan-in of several byte streams (`combine_streams`).
//! - [`lines`]: line buffering across chunk boundaries.

pub mod combine;
pub mod event;
pub mod lines;

pub use combine::{BoxedSource, Chunk, CombinedStream, combine_streams};
pub use event::{EVENT_CLOSE, EventEmitter, EventError, wait_for_event};
pub use lines::LineSplitter;
