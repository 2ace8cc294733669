//! # Data Module
//!
//! ## Role
//! In-memory representations of the alignment data the core operates on.
//!
//! ## Design Notes
//! - Sequences are byte slices (`Vec<u8>`), never `String`: the alphabet is
//!   ASCII bases plus the two gap characters, and the hot loops index columns
//!   directly.
//! - **Zero-cost newtype:** the arena owns every alignment record and
//!   everything downstream refers to records by [`alignment::AlnId`], so
//!   open haplotypes never hold references into the arena.
//!
//! ## Sub-modules
//! - `alignment`: pairwise-alignment record, arena and start-position index

pub mod alignment;
