//! Frame buffers, blur and layer compositing.

pub(crate) mod blur;
/// Layer compositor and fade envelope.
pub mod compositor;
/// RGBA frame buffer.
pub mod frame;
