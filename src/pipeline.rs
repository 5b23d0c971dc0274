//! The render job contract: inputs in, MP4 (or any [`FrameSink`]) out.

use std::path::{Path, PathBuf};

use crate::assets::decode::load_cover;
use crate::assets::media::read_audio_duration;
use crate::config::RenderConfig;
use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
use crate::encode::sink::{AudioInput, FrameSink, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{LyricReelError, LyricReelResult};
use crate::layers::background::BackgroundLayer;
use crate::layers::cover::CoverLayer;
use crate::layers::lyrics::LyricsLayer;
use crate::lyrics::lrc::{LyricEntry, read_lrc_file};
use crate::render::compositor::{Compositor, FadeEnvelope};
use crate::render::frame::FrameRGBA;
use crate::text::font::FontCatalog;
use crate::text::script::{Script, detect_script};
use crate::text::wrap::WrapStrategy;

/// Progress callback: `(percent, message)`.
pub type ProgressFn<'a> = &'a mut dyn FnMut(u8, &str);

/// One lyric video to render.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RenderJob {
    /// Audio track; its length is the video length.
    pub audio_path: PathBuf,
    /// LRC lyrics.
    pub lyrics_path: PathBuf,
    /// Cover art.
    pub cover_path: PathBuf,
    /// Output MP4.
    pub output_path: PathBuf,
}

impl RenderJob {
    /// Fail with [`LyricReelError::InputMissing`] unless every input file exists.
    pub fn validate_inputs(&self) -> LyricReelResult<()> {
        for (what, path) in [
            ("audio file", &self.audio_path),
            ("lyrics file", &self.lyrics_path),
            ("cover image", &self.cover_path),
        ] {
            if !path.is_file() {
                return Err(LyricReelError::input_missing(format!(
                    "{what} '{}' not found",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Summary of a finished job.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderReport {
    /// Frames pushed to the sink.
    pub frames: u64,
    /// Video duration in seconds.
    pub duration_secs: f64,
    /// Script detected from the lyrics.
    pub script: Script,
    /// Number of lyric entries rendered.
    pub entries: usize,
}

struct Progress<'a> {
    cb: Option<ProgressFn<'a>>,
}

impl Progress<'_> {
    fn report(&mut self, percent: u8, message: &str) {
        tracing::info!(percent, message, "progress");
        if let Some(cb) = self.cb.as_mut() {
            (*cb)(percent, message);
        }
    }
}

/// The three layers plus the compositor, ready to render any `t`.
pub struct LyricScene {
    background: BackgroundLayer,
    cover: CoverLayer,
    lyrics: LyricsLayer,
    compositor: Compositor,
    duration: f64,
    script: Script,
    entries: usize,
}

impl std::fmt::Debug for LyricScene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LyricScene")
            .field("duration", &self.duration)
            .field("script", &self.script)
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

impl LyricScene {
    /// Parse the lyrics, load fonts and prepare every layer.
    ///
    /// Fails with [`LyricReelError::EmptyLyrics`] when no entry starts before `duration`.
    pub fn prepare(
        lyrics_path: &Path,
        cover_path: &Path,
        duration: f64,
        cfg: &RenderConfig,
        catalog: &FontCatalog,
    ) -> LyricReelResult<Self> {
        Self::prepare_with_progress(
            lyrics_path,
            cover_path,
            duration,
            cfg,
            catalog,
            &mut Progress { cb: None },
        )
    }

    fn prepare_with_progress(
        lyrics_path: &Path,
        cover_path: &Path,
        duration: f64,
        cfg: &RenderConfig,
        catalog: &FontCatalog,
        progress: &mut Progress<'_>,
    ) -> LyricReelResult<Self> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(LyricReelError::validation("duration must be finite and > 0"));
        }

        progress.report(5, "parsing lyrics");
        let entries = read_lrc_file(lyrics_path, duration)?;
        if entries.is_empty() {
            return Err(LyricReelError::empty_lyrics(format!(
                "'{}' has no timed lines before {duration:.2}s",
                lyrics_path.display()
            )));
        }
        let script = detect_script(&joined_text(&entries));
        tracing::info!(entries = entries.len(), ?script, "lyrics parsed");

        progress.report(10, "loading fonts");
        let fonts = catalog.load(script)?;

        progress.report(15, "building layers");
        let cover = load_cover(cover_path)?;
        let background = BackgroundLayer::new(&cover, cfg)?;
        let cover_layer = CoverLayer::new(&cover, cfg)?;
        let entry_count = entries.len();
        let lyrics = LyricsLayer::new(entries, &fonts, &WrapStrategy::for_script(script), cfg)?;

        Ok(Self {
            background,
            cover: cover_layer,
            lyrics,
            compositor: Compositor::new(
                cfg.canvas,
                FadeEnvelope {
                    duration,
                    fade_in: cfg.fade_in_secs,
                    fade_out: cfg.fade_out_secs,
                },
            ),
            duration,
            script,
            entries: entry_count,
        })
    }

    /// Video duration in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Detected script.
    pub fn script(&self) -> Script {
        self.script
    }

    /// Lyrics layer, for inspecting the scroll state.
    pub fn lyrics(&self) -> &LyricsLayer {
        &self.lyrics
    }

    /// Lyrics layer, for stepping its plan without painting.
    pub fn lyrics_mut(&mut self) -> &mut LyricsLayer {
        &mut self.lyrics
    }

    /// Advance the scroll state to `t` without painting.
    pub fn advance(&mut self, t: f64) {
        self.lyrics.plan(t);
    }

    /// Render the composited frame at `t`.
    ///
    /// Calls must come in increasing `t`: the lyrics layer eases its scroll cursor once per call.
    pub fn render(&mut self, t: f64) -> LyricReelResult<FrameRGBA> {
        let bg = self.background.frame(t);
        let lyrics = self.lyrics.frame(t)?;
        self.compositor.compose(t, &bg, self.cover.frame(), &lyrics)
    }
}

fn joined_text(entries: &[LyricEntry]) -> String {
    entries
        .iter()
        .map(|e| e.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render `job` into `sink`.
///
/// Milestones: 0 preparing, 5 parsing lyrics, 10 loading fonts, 15 building layers, 20..95
/// rendering (once per second of video), 95 finalizing, 100 done. Every input check happens
/// before `sink.begin`, so a failing job never creates output.
#[tracing::instrument(skip(cfg, catalog, sink, progress), fields(out = %job.output_path.display()))]
pub fn render_job(
    job: &RenderJob,
    cfg: &RenderConfig,
    catalog: &FontCatalog,
    sink: &mut dyn FrameSink,
    progress: Option<ProgressFn<'_>>,
) -> LyricReelResult<RenderReport> {
    let mut progress = Progress { cb: progress };
    progress.report(0, "preparing");
    cfg.validate()?;
    job.validate_inputs()?;
    let duration = read_audio_duration(&job.audio_path)?;

    let mut scene = LyricScene::prepare_with_progress(
        &job.lyrics_path,
        &job.cover_path,
        duration,
        cfg,
        catalog,
        &mut progress,
    )?;

    let fps = cfg.fps;
    let total = fps.secs_to_frames_floor(duration);
    let per_second = fps.as_f64().round().max(1.0) as u64;

    progress.report(20, "rendering");
    sink.begin(SinkConfig {
        width: cfg.canvas.width,
        height: cfg.canvas.height,
        fps,
        audio: Some(AudioInput {
            path: job.audio_path.clone(),
        }),
    })?;

    for i in 0..total {
        let idx = FrameIndex(i);
        let t = fps.frame_to_secs(idx);
        let frame = scene.render(t)?;
        sink.push_frame(idx, &frame)?;

        if i > 0 && i % per_second == 0 {
            let pct = 20 + (75 * i / total) as u8;
            progress.report(pct, &format!("rendering {:.0}s / {:.0}s", t, duration));
        }
    }

    progress.report(95, "finalizing");
    sink.end()?;
    progress.report(100, "done");

    Ok(RenderReport {
        frames: total,
        duration_secs: duration,
        script: scene.script(),
        entries: scene.entries,
    })
}

/// Render `job` to its MP4 output with `ffmpeg`.
///
/// A partially written output file is removed when the job fails after encoding started.
pub fn render_job_to_mp4(
    job: &RenderJob,
    cfg: &RenderConfig,
    catalog: &FontCatalog,
    progress: Option<ProgressFn<'_>>,
) -> LyricReelResult<RenderReport> {
    let existed = job.output_path.exists();
    let mut sink = FfmpegSink::new(
        FfmpegSinkOpts::new(&job.output_path).with_quality(cfg.crf, cfg.preset.clone()),
    );
    let res = render_job(job, cfg, catalog, &mut sink, progress);
    drop(sink);

    if res.is_err() && !existed && job.output_path.exists() {
        // Best effort; the render error is what the caller needs to see.
        let _ = std::fs::remove_file(&job.output_path);
    }
    res
}

/// Render one composited preview frame at `t`.
///
/// The scroll cursor is warmed up by stepping every frame time before `t`, so the result matches
/// the frame a full render would produce at the same time.
pub fn render_preview_frame(
    lyrics_path: &Path,
    cover_path: &Path,
    duration: f64,
    t: f64,
    cfg: &RenderConfig,
    catalog: &FontCatalog,
) -> LyricReelResult<FrameRGBA> {
    cfg.validate()?;
    if !(0.0..=duration).contains(&t) {
        return Err(LyricReelError::validation(format!(
            "preview time {t}s is outside 0..={duration}s"
        )));
    }
    for (what, path) in [("lyrics file", lyrics_path), ("cover image", cover_path)] {
        if !path.is_file() {
            return Err(LyricReelError::input_missing(format!(
                "{what} '{}' not found",
                path.display()
            )));
        }
    }

    let mut scene = LyricScene::prepare(lyrics_path, cover_path, duration, cfg, catalog)?;
    let fps = cfg.fps;
    let mut i = 0u64;
    loop {
        let ti = fps.frame_to_secs(FrameIndex(i));
        if ti >= t {
            break;
        }
        scene.advance(ti);
        i += 1;
    }
    scene.render(t)
}
