//! # Pipelines Module (Orchestration)
//!
//! High-level workflow coordination: connects I/O, data structures and the
//! enumerator. Pipelines own the execution flow (load data through `io`,
//! process through `model`, write through `io`), and the completion
//! sentinel's lifecycle brackets everything.

pub mod calling;

pub use calling::CallingPipeline;
