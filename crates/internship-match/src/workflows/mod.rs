//! Domain workflows exposed by the crate.

pub mod matching;
