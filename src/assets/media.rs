use std::path::Path;

use lofty::file::AudioFile;
use lofty::probe::Probe;

use crate::foundation::error::{LyricReelError, LyricReelResult};

/// Duration of the audio track at `path`, in seconds.
///
/// The container headers are read with `lofty`; only headers are read.
pub fn read_audio_duration(path: &Path) -> LyricReelResult<f64> {
    if !path.is_file() {
        return Err(LyricReelError::input_missing(format!(
            "audio file '{}' not found",
            path.display()
        )));
    }
    let tagged = Probe::open(path)
        .and_then(|p| p.read())
        .map_err(|e| LyricReelError::render(format!("read audio '{}': {e}", path.display())))?;
    let secs = tagged.properties().duration().as_secs_f64();
    if secs <= 0.0 {
        return Err(LyricReelError::validation(format!(
            "audio file '{}' reports zero duration",
            path.display()
        )));
    }
    tracing::debug!(path = %path.display(), secs, "audio duration read");
    Ok(secs)
}
