#![allow(dead_code)]

use std::path::{Path, PathBuf};

use lyricreel::FontPair;

/// Fresh scratch directory under `target/`.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("it").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Write `secs` of silent 8 kHz mono 16-bit PCM as a WAV file.
pub fn write_silent_wav(path: &Path, secs: u32) {
    let rate = 8000u32;
    let data_len = rate * 2 * secs;
    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&1u16.to_le_bytes()); // mono
    out.extend_from_slice(&rate.to_le_bytes());
    out.extend_from_slice(&(rate * 2).to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.resize(44 + data_len as usize, 0);
    std::fs::write(path, out).unwrap();
}

/// Solid-color 100x100 PNG cover.
pub fn write_cover(path: &Path) {
    image::RgbImage::from_pixel(100, 100, image::Rgb([40, 90, 160]))
        .save(path)
        .unwrap();
}

pub const HELLO_WORLD_LRC: &str = "[ti:Test]\n[00:00.00]Hello\n[00:05.00]World\n";

/// A bold/regular TTF pair installed on this machine, if any.
pub fn system_font_pair() -> Option<FontPair> {
    let candidates = [
        (
            "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        ),
        (
            "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        ),
        (
            "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
        ),
        (
            "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        ),
        (
            "/Library/Fonts/Arial Bold.ttf",
            "/Library/Fonts/Arial.ttf",
        ),
        ("C:\\Windows\\Fonts\\arialbd.ttf", "C:\\Windows\\Fonts\\arial.ttf"),
    ];
    candidates.iter().find_map(|(bold, regular)| {
        let (bold, regular) = (Path::new(bold), Path::new(regular));
        (bold.is_file() && regular.is_file()).then(|| FontPair {
            bold: bold.to_path_buf(),
            regular: regular.to_path_buf(),
        })
    })
}
