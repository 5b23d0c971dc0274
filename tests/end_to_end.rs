mod support;

use lyricreel::lyrics::scroll::{LineDraw, LineStyle};
use lyricreel::{
    FontCatalog, FrameIndex, FrameRGBA, FrameSink, LyricReelError, LyricReelResult, LyricScene,
    RenderConfig, RenderJob, SinkConfig, render_job, render_job_to_mp4,
};

/// Counts frames and keeps a couple of samples instead of every frame.
#[derive(Default)]
struct SamplingSink {
    cfg: Option<SinkConfig>,
    frames: u64,
    last_idx: Option<u64>,
    first: Option<FrameRGBA>,
    at_5s: Option<FrameRGBA>,
    ended: bool,
}

impl FrameSink for SamplingSink {
    fn begin(&mut self, cfg: SinkConfig) -> LyricReelResult<()> {
        self.cfg = Some(cfg);
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> LyricReelResult<()> {
        if let Some(last) = self.last_idx {
            assert!(idx.0 > last, "frames must arrive in increasing order");
        }
        self.last_idx = Some(idx.0);
        self.frames += 1;
        match idx.0 {
            0 => self.first = Some(frame.clone()),
            120 => self.at_5s = Some(frame.clone()),
            _ => {}
        }
        Ok(())
    }

    fn end(&mut self) -> LyricReelResult<()> {
        self.ended = true;
        Ok(())
    }
}

fn hello_world_job(name: &str) -> RenderJob {
    let dir = support::scratch_dir(name);
    let job = RenderJob {
        audio_path: dir.join("song.wav"),
        lyrics_path: dir.join("song.lrc"),
        cover_path: dir.join("cover.png"),
        output_path: dir.join("out.mp4"),
    };
    support::write_silent_wav(&job.audio_path, 10);
    std::fs::write(&job.lyrics_path, support::HELLO_WORLD_LRC).unwrap();
    support::write_cover(&job.cover_path);
    job
}

#[test]
fn ten_second_song_renders_every_frame_in_order() {
    let Some(fonts) = support::system_font_pair() else {
        eprintln!("skipping: no system TTF fonts found");
        return;
    };
    let job = hello_world_job("e2e_frames");
    let cfg = RenderConfig::default();
    let catalog = FontCatalog::uniform(fonts);

    let mut sink = SamplingSink::default();
    let mut percents = Vec::new();
    let mut cb = |p: u8, _: &str| percents.push(p);
    let report = render_job(
        &job,
        &cfg,
        &catalog,
        &mut sink,
        Some(&mut cb as lyricreel::ProgressFn<'_>),
    )
    .unwrap();

    assert!((239..=240).contains(&report.frames), "{}", report.frames);
    assert_eq!(sink.frames, report.frames);
    assert!(sink.ended);
    assert_eq!(report.entries, 2);

    let sink_cfg = sink.cfg.as_ref().unwrap();
    assert_eq!((sink_cfg.width, sink_cfg.height), (1280, 720));
    assert_eq!(
        sink_cfg.audio.as_ref().map(|a| a.path.clone()),
        Some(job.audio_path.clone())
    );

    // Fade-in starts from black.
    let first = sink.first.as_ref().unwrap();
    assert!(first.data.chunks_exact(4).all(|p| p == [0, 0, 0, 255]));

    // Mid-song frames are opaque and lit.
    let mid = sink.at_5s.as_ref().unwrap();
    assert!(mid.data.chunks_exact(4).all(|p| p[3] == 255));
    assert!(mid.data.chunks_exact(4).any(|p| p[0] > 0));

    assert_eq!(percents.first(), Some(&0));
    assert_eq!(percents.last(), Some(&100));
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    for m in [5, 10, 15, 20, 95] {
        assert!(percents.contains(&m), "missing milestone {m}");
    }
}

#[test]
fn hello_is_active_at_start_and_world_at_five_seconds() {
    let Some(fonts) = support::system_font_pair() else {
        eprintln!("skipping: no system TTF fonts found");
        return;
    };
    let job = hello_world_job("e2e_active");
    let mut scene = LyricScene::prepare(
        &job.lyrics_path,
        &job.cover_path,
        10.0,
        &RenderConfig::default(),
        &FontCatalog::uniform(fonts),
    )
    .unwrap();

    let scroller = scene.lyrics().scroller();
    let entries = scroller.entries();
    assert_eq!(scroller.active_index(0.0).map(|i| &entries[i].text[..]), Some("Hello"));
    assert_eq!(scroller.active_index(5.0).map(|i| &entries[i].text[..]), Some("World"));

    // The blue backdrop never gets near white, so white pixels in the lyric area are text.
    let with_text = scene.render(5.0).unwrap();
    assert_eq!(with_text.width, 1280);
    let area_px = (600..1178)
        .flat_map(|x| (200..600).map(move |y| (x, y)))
        .filter_map(|(x, y)| with_text.pixel(x, y))
        .filter(|p| p[0] > 200 && p[1] > 200 && p[2] > 200)
        .count();
    assert!(area_px > 0, "expected bright lyric pixels near the center");
}

#[test]
fn active_lines_are_drawn_at_full_alpha() {
    let Some(fonts) = support::system_font_pair() else {
        eprintln!("skipping: no system TTF fonts found");
        return;
    };
    let job = hello_world_job("e2e_plan");
    let cfg = RenderConfig::default();
    let mut scene =
        LyricScene::prepare(&job.lyrics_path, &job.cover_path, 10.0, &cfg, &FontCatalog::uniform(fonts))
            .unwrap();

    let fps = cfg.fps;
    for i in 0..=120u64 {
        let t = fps.frame_to_secs(FrameIndex(i));
        let plan = scene.lyrics_mut().plan(t);
        let expected = match i {
            0 => "Hello",
            120 => "World",
            _ => continue,
        };

        let entry = plan.active.expect("an entry is active");
        let active: Vec<&LineDraw> = plan
            .lines
            .iter()
            .filter(|l| l.style == LineStyle::Active)
            .collect();
        assert_eq!(active.len(), 1, "t={t}");
        assert_eq!(active[0].entry, entry);
        assert_eq!(active[0].text, expected);
        assert_eq!(active[0].color.a, 255);
        assert_eq!(active[0].color, cfg.active.color);
        assert!(active[0].glow.is_some());

        for other in plan.lines.iter().filter(|l| l.style == LineStyle::Inactive) {
            assert_ne!(other.text, expected);
            assert!(other.color.a < 255);
        }
    }
}

#[test]
fn only_wrapped_lines_are_kept_shaped() {
    let Some(fonts) = support::system_font_pair() else {
        eprintln!("skipping: no system TTF fonts found");
        return;
    };
    let job = hello_world_job("e2e_shaped");
    std::fs::write(
        &job.lyrics_path,
        "[00:00.00]The quick brown fox jumps over the lazy dog while the band keeps playing \
         on and on until the morning light comes through the window\n[00:05.00]World\n",
    )
    .unwrap();
    let mut scene = LyricScene::prepare(
        &job.lyrics_path,
        &job.cover_path,
        10.0,
        &RenderConfig::default(),
        &FontCatalog::uniform(fonts),
    )
    .unwrap();
    assert_eq!(scene.lyrics().shaped_lines(), 0);

    let layouts = scene.lyrics().scroller().cache().layouts();
    assert!(layouts[0].lines.len() > 1, "{:?}", layouts[0].lines);
    let final_lines: usize = layouts.iter().map(|l| l.lines.len()).sum();

    scene.lyrics_mut().plan(0.0);
    let shaped = scene.lyrics().shaped_lines();
    assert!(shaped > 0);
    assert!(shaped <= final_lines, "{shaped} shaped, {final_lines} wrapped lines");
}

#[test]
fn empty_lyrics_fail_without_creating_output() {
    let dir = support::scratch_dir("e2e_empty");
    let job = RenderJob {
        audio_path: dir.join("song.wav"),
        lyrics_path: dir.join("empty.lrc"),
        cover_path: dir.join("cover.png"),
        output_path: dir.join("out.mp4"),
    };
    support::write_silent_wav(&job.audio_path, 2);
    std::fs::write(&job.lyrics_path, "[ar:Nobody]\n[al:Nothing]\n").unwrap();
    support::write_cover(&job.cover_path);

    let err = render_job_to_mp4(
        &job,
        &RenderConfig::default(),
        &FontCatalog::noto_in_dir(dir.join("fonts")),
        None,
    )
    .unwrap_err();
    assert!(matches!(err, LyricReelError::EmptyLyrics(_)), "{err}");
    assert!(!job.output_path.exists());
}

#[test]
fn missing_fonts_fail_before_any_frame() {
    let job = hello_world_job("e2e_nofonts");
    let mut sink = SamplingSink::default();
    let err = render_job(
        &job,
        &RenderConfig::default(),
        &FontCatalog::noto_in_dir("target/it/no-fonts-here"),
        &mut sink,
        None,
    )
    .unwrap_err();
    assert!(matches!(err, LyricReelError::FontLoad(_)), "{err}");
    assert!(sink.cfg.is_none());
    assert_eq!(sink.frames, 0);
}

#[test]
fn mp4_output_has_the_audio_length() {
    if !lyricreel::is_ffmpeg_on_path() {
        eprintln!("skipping: ffmpeg not found on PATH");
        return;
    }
    let Some(fonts) = support::system_font_pair() else {
        eprintln!("skipping: no system TTF fonts found");
        return;
    };
    let job = hello_world_job("e2e_mp4");
    let cfg = RenderConfig {
        preset: "ultrafast".to_string(),
        ..RenderConfig::default()
    };

    let report = render_job_to_mp4(&job, &cfg, &FontCatalog::uniform(fonts), None).unwrap();
    assert!(job.output_path.is_file());
    assert!(std::fs::metadata(&job.output_path).unwrap().len() > 0);

    let secs = lyricreel::read_audio_duration(&job.output_path).unwrap();
    assert!((secs - report.duration_secs).abs() < 0.5, "{secs}");
}
