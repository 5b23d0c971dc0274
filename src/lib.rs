//! lyricreel renders lyric videos: a blurred, breathing cover backdrop, a rounded cover panel and
//! scrolling karaoke-style lyrics, muxed with the audio track into an MP4 by the system `ffmpeg`.
//!
//! The public API is job-oriented:
//!
//! - Describe inputs with a [`RenderJob`]
//! - Render it into any [`FrameSink`] with [`render_job`], or straight to MP4 with
//!   [`render_job_to_mp4`]
//! - Queue several jobs on a background thread with [`spawn_worker`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod foundation;
mod text;

/// Render configuration.
pub mod config;
/// Encoding sinks.
pub mod encode;
/// Per-frame layers.
pub mod layers;
/// Lyric parsing, layout and scrolling.
pub mod lyrics;
/// Render job pipeline.
pub mod pipeline;
/// Frame buffers and compositing.
pub mod render;
/// Background job worker.
pub mod worker;

pub use crate::assets::decode::{decode_cover, load_cover};
pub use crate::assets::media::read_audio_duration;
pub use crate::config::{RenderConfig, TextStyle};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use crate::encode::sink::{AudioInput, FrameSink, InMemorySink, SinkConfig};
pub use crate::foundation::core::{Canvas, Fps, FrameIndex, Rect, Rgba8};
pub use crate::foundation::error::{LyricReelError, LyricReelResult};
pub use crate::lyrics::lrc::{LyricEntry, parse_lrc, read_lrc_file};
pub use crate::pipeline::{
    LyricScene, ProgressFn, RenderJob, RenderReport, render_job, render_job_to_mp4,
    render_preview_frame,
};
pub use crate::render::compositor::{Compositor, FadeEnvelope, fade_envelope};
pub use crate::render::frame::FrameRGBA;
pub use crate::text::font::{FontCatalog, FontFace, FontPair, LoadedFonts, TextShaper};
pub use crate::text::script::{Script, detect_script};
pub use crate::text::wrap::{MonospaceMeasure, Segmenter, TextExtent, TextMeasure, WrapStrategy};
pub use crate::worker::{
    CheckedJobs, WorkerEvent, WorkerHandle, check_jobs, spawn_worker, spawn_worker_with,
};
