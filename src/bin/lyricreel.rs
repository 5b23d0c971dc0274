use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "lyricreel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render an MP4 lyric video (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Render a single composited frame as a PNG.
    Frame(FrameArgs),
    /// Render every job of a JSON manifest on the background worker.
    Batch(BatchArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Directory holding the Noto Sans font families.
    #[arg(long, default_value = "Fonts")]
    fonts: PathBuf,

    /// Bold font used for every script, overriding `--fonts`.
    #[arg(long, requires = "font_regular")]
    font_bold: Option<PathBuf>,

    /// Regular font used for every script, overriding `--fonts`.
    #[arg(long, requires = "font_bold")]
    font_regular: Option<PathBuf>,

    /// JSON render configuration; missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Audio track.
    #[arg(long)]
    audio: PathBuf,

    /// LRC lyrics.
    #[arg(long)]
    lyrics: PathBuf,

    /// Cover image.
    #[arg(long)]
    cover: PathBuf,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct FrameArgs {
    /// Audio track; its length is the video length.
    #[arg(long, required_unless_present = "duration", conflicts_with = "duration")]
    audio: Option<PathBuf>,

    /// Video length in seconds, instead of probing `--audio`.
    #[arg(long)]
    duration: Option<f64>,

    /// LRC lyrics.
    #[arg(long)]
    lyrics: PathBuf,

    /// Cover image.
    #[arg(long)]
    cover: PathBuf,

    /// Sample time in seconds.
    #[arg(long)]
    time: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// JSON array of `{audio_path, lyrics_path, cover_path, output_path}` jobs.
    #[arg(long)]
    manifest: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Batch(args) => cmd_batch(args),
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(common: &CommonArgs) -> anyhow::Result<lyricreel::RenderConfig> {
    let cfg = match &common.config {
        Some(path) => lyricreel::RenderConfig::from_json_file(path)?,
        None => lyricreel::RenderConfig::default(),
    };
    Ok(cfg)
}

fn font_catalog(common: &CommonArgs) -> lyricreel::FontCatalog {
    match (&common.font_bold, &common.font_regular) {
        (Some(bold), Some(regular)) => lyricreel::FontCatalog::uniform(lyricreel::FontPair {
            bold: bold.clone(),
            regular: regular.clone(),
        }),
        _ => lyricreel::FontCatalog::noto_in_dir(&common.fonts),
    }
}

fn print_progress(percent: u8, message: &str) {
    eprintln!("[{percent:>3}%] {message}");
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.common)?;
    let catalog = font_catalog(&args.common);
    let job = lyricreel::RenderJob {
        audio_path: args.audio,
        lyrics_path: args.lyrics,
        cover_path: args.cover,
        output_path: args.out,
    };

    let mut progress = print_progress;
    let report = lyricreel::render_job_to_mp4(
        &job,
        &cfg,
        &catalog,
        Some(&mut progress as lyricreel::ProgressFn<'_>),
    )?;

    eprintln!(
        "wrote {} ({} frames, {:.2}s, {:?})",
        job.output_path.display(),
        report.frames,
        report.duration_secs,
        report.script
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.common)?;
    let catalog = font_catalog(&args.common);

    let duration = match (args.duration, &args.audio) {
        (Some(d), _) => d,
        (None, Some(audio)) => lyricreel::read_audio_duration(audio)?,
        (None, None) => anyhow::bail!("either --audio or --duration is required"),
    };

    let frame = lyricreel::render_preview_frame(
        &args.lyrics,
        &args.cover,
        duration,
        args.time,
        &cfg,
        &catalog,
    )?;

    write_png(&args.out, &frame)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn write_png(path: &Path, frame: &lyricreel::FrameRGBA) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        path,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

fn read_manifest(path: &Path) -> anyhow::Result<Vec<lyricreel::RenderJob>> {
    let f = File::open(path).with_context(|| format!("open manifest '{}'", path.display()))?;
    let jobs: Vec<lyricreel::RenderJob> = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parse manifest '{}'", path.display()))?;
    Ok(jobs)
}

fn cmd_batch(args: BatchArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.common)?;
    let catalog = font_catalog(&args.common);
    let jobs = read_manifest(&args.manifest)?;
    if jobs.is_empty() {
        anyhow::bail!("manifest '{}' lists no jobs", args.manifest.display());
    }

    let checked = lyricreel::check_jobs(jobs);
    for (job, error) in &checked.rejected {
        eprintln!("skipped {}: {error}", job.output_path.display());
    }
    let rejected = checked.rejected.len();
    if checked.runnable.is_empty() {
        anyhow::bail!("no job in '{}' has all its inputs", args.manifest.display());
    }

    let handle = lyricreel::spawn_worker(checked.runnable, cfg, catalog);
    let mut failed = rejected;
    for event in handle.events().iter() {
        match event {
            lyricreel::WorkerEvent::JobStarted { job, total } => {
                eprintln!("job {}/{total}", job + 1);
            }
            lyricreel::WorkerEvent::Progress {
                percent, message, ..
            } => print_progress(percent, &message),
            lyricreel::WorkerEvent::JobFailed { job, error } => {
                eprintln!("job {} failed: {error}", job + 1);
            }
            lyricreel::WorkerEvent::JobFinished { job, frames } => {
                eprintln!("job {} finished ({frames} frames)", job + 1);
            }
            lyricreel::WorkerEvent::Finished {
                succeeded,
                failed: n,
            } => {
                failed += n;
                eprintln!("{succeeded} succeeded, {n} failed");
            }
            lyricreel::WorkerEvent::Cancelled { skipped } => {
                eprintln!("cancelled, {skipped} jobs skipped");
            }
        }
    }
    handle
        .join()
        .map_err(|_| anyhow::anyhow!("render worker panicked"))?;

    if failed > 0 {
        anyhow::bail!("{failed} job(s) failed");
    }
    Ok(())
}
