//! Input media: cover image decoding and audio probing.

pub(crate) mod decode;
pub(crate) mod media;
