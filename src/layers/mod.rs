//! The three per-frame layers, back to front.

/// Blurred, breathing cover backdrop.
pub mod background;
/// Rounded cover-art panel.
pub mod cover;
/// Scrolling lyrics painter.
pub mod lyrics;
