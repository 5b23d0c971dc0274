//! Timed lyrics: parsing, column layout and the scroll state machine.

/// Precomputed per-entry layouts.
pub mod layout;
/// LRC parser.
pub mod lrc;
/// Scroll cursor and per-frame draw planning.
pub mod scroll;
