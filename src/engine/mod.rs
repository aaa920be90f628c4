//! Core engine: snapshot fetch, per-symbol analysis and ranking.

pub mod scanner;
