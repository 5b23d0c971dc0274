//! Script detection, fonts and line wrapping.

pub(crate) mod font;
pub(crate) mod script;
pub(crate) mod wrap;
