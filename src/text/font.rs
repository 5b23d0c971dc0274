//! Font resources: the script → font-pair catalog and Parley-backed shaping.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::foundation::error::{LyricReelError, LyricReelResult};
use crate::text::script::Script;
use crate::text::wrap::{TextExtent, TextMeasure};

/// Bold ("highlight") and regular ("standard") font files for one script.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FontPair {
    /// Font used for the active lyric entry.
    pub bold: PathBuf,
    /// Font used for every other entry.
    pub regular: PathBuf,
}

impl FontPair {
    /// `<dir>/<family>-Bold.ttf` and `<dir>/<family>-Regular.ttf`.
    pub fn in_dir(dir: &Path, family: &str) -> Self {
        Self {
            bold: dir.join(format!("{family}-Bold.ttf")),
            regular: dir.join(format!("{family}-Regular.ttf")),
        }
    }
}

/// Explicit script → font pair mapping.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FontCatalog {
    /// Fonts for [`Script::Latin`].
    pub latin: FontPair,
    /// Fonts for [`Script::Cjk`].
    pub cjk: FontPair,
    /// Fonts for [`Script::Japanese`].
    pub japanese: FontPair,
}

impl FontCatalog {
    /// Noto Sans families laid out in one directory.
    pub fn noto_in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            latin: FontPair::in_dir(dir, "NotoSans"),
            cjk: FontPair::in_dir(dir, "NotoSansSC"),
            japanese: FontPair::in_dir(dir, "NotoSansJP"),
        }
    }

    /// Same pair for every script.
    pub fn uniform(pair: FontPair) -> Self {
        Self {
            latin: pair.clone(),
            cjk: pair.clone(),
            japanese: pair,
        }
    }

    /// Font pair for `script`.
    pub fn pair(&self, script: Script) -> &FontPair {
        match script {
            Script::Latin => &self.latin,
            Script::Cjk => &self.cjk,
            Script::Japanese => &self.japanese,
        }
    }

    /// Read and validate the font pair for `script`.
    ///
    /// Fails with [`LyricReelError::FontLoad`] when either file is missing or not a usable font.
    pub fn load(&self, script: Script) -> LyricReelResult<LoadedFonts> {
        let pair = self.pair(script);
        tracing::debug!(?script, bold = %pair.bold.display(), regular = %pair.regular.display(), "loading fonts");
        Ok(LoadedFonts {
            bold: FontFace::from_path(&pair.bold)?,
            regular: FontFace::from_path(&pair.regular)?,
        })
    }
}

/// Validated font pair for one job.
#[derive(Clone, Debug)]
pub struct LoadedFonts {
    /// Bold face (active entry).
    pub bold: FontFace,
    /// Regular face (other entries).
    pub regular: FontFace,
}

/// A font file checked to contain at least one named family.
#[derive(Clone)]
pub struct FontFace {
    bytes: Arc<Vec<u8>>,
    family: String,
    data: vello_cpu::peniko::FontData,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("family", &self.family)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl FontFace {
    /// Read a font file.
    pub fn from_path(path: &Path) -> LyricReelResult<Self> {
        if !path.is_file() {
            return Err(LyricReelError::font_load(format!(
                "font file '{}' not found",
                path.display()
            )));
        }
        let bytes = std::fs::read(path).map_err(|e| {
            LyricReelError::font_load(format!("failed to read '{}': {e}", path.display()))
        })?;
        Self::from_bytes(bytes).map_err(|e| match e {
            LyricReelError::FontLoad(msg) => {
                LyricReelError::font_load(format!("'{}': {msg}", path.display()))
            }
            other => other,
        })
    }

    /// Validate raw font bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> LyricReelResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let family = register_family(&mut font_ctx, &bytes)?;
        let bytes = Arc::new(bytes);
        let data = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(bytes.as_ref().clone()),
            0,
        );
        Ok(Self {
            bytes,
            family,
            data,
        })
    }

    /// Family name reported by the font.
    pub fn family(&self) -> &str {
        &self.family
    }

    pub(crate) fn font_data(&self) -> &vello_cpu::peniko::FontData {
        &self.data
    }

    /// Build a shaper for this face at `size_px`.
    pub fn shaper(&self, size_px: f32) -> LyricReelResult<TextShaper> {
        TextShaper::new(self, size_px)
    }
}

fn register_family(font_ctx: &mut parley::FontContext, bytes: &[u8]) -> LyricReelResult<String> {
    let families = font_ctx
        .collection
        .register_fonts(parley::fontique::Blob::from(bytes.to_vec()), None);
    let family_id = families
        .first()
        .map(|(id, _)| *id)
        .ok_or_else(|| LyricReelError::font_load("no font families found in font data"))?;
    let name = font_ctx
        .collection
        .family_name(family_id)
        .ok_or_else(|| LyricReelError::font_load("registered font family has no name"))?;
    Ok(name.to_string())
}

/// Shapes single lines of text in one face and size.
pub struct TextShaper {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    family: String,
    size_px: f32,
}

impl TextShaper {
    fn new(face: &FontFace, size_px: f32) -> LyricReelResult<Self> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(LyricReelError::validation(
                "text size_px must be finite and > 0",
            ));
        }
        let mut font_ctx = parley::FontContext::default();
        let family = register_family(&mut font_ctx, &face.bytes)?;
        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family,
            size_px,
        })
    }

    /// Font size in pixels.
    pub fn size_px(&self) -> f32 {
        self.size_px
    }

    /// Lay `text` out on a single unbounded line.
    pub fn shape(&mut self, text: &str) -> parley::Layout<()> {
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(self.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(self.size_px));

        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(None);
        layout.align(
            None,
            parley::Alignment::Start,
            parley::AlignmentOptions::default(),
        );
        layout
    }
}

impl TextMeasure for TextShaper {
    fn measure(&mut self, text: &str) -> TextExtent {
        let layout = self.shape(text);
        TextExtent {
            width: layout.width(),
            height: layout.height(),
        }
    }
}
