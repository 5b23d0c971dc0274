/// Result alias used across lyricreel APIs.
pub type LyricReelResult<T> = Result<T, LyricReelError>;

/// Error taxonomy for render jobs.
///
/// Every variant renders as a human-readable message with a stable prefix so callers (the CLI,
/// the background worker) can surface it verbatim.
#[derive(thiserror::Error, Debug)]
pub enum LyricReelError {
    /// A required input file is absent.
    #[error("missing input: {0}")]
    InputMissing(String),

    /// The lyric source could not be read or decoded.
    #[error("lyric parse error: {0}")]
    Parse(String),

    /// The lyric source parsed, but contained no usable entries.
    #[error("no lyrics to render: {0}")]
    EmptyLyrics(String),

    /// Font files for the detected script are missing or unreadable.
    #[error("font load error: {0}")]
    FontLoad(String),

    /// Failure while computing frames or encoding.
    #[error("render failure: {0}")]
    Render(String),

    /// Invalid configuration or arguments.
    #[error("validation error: {0}")]
    Validation(String),

    /// Any other error, with source context.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LyricReelError {
    /// Construct [`LyricReelError::InputMissing`].
    pub fn input_missing(msg: impl Into<String>) -> Self {
        Self::InputMissing(msg.into())
    }

    /// Construct [`LyricReelError::Parse`].
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Construct [`LyricReelError::EmptyLyrics`].
    pub fn empty_lyrics(msg: impl Into<String>) -> Self {
        Self::EmptyLyrics(msg.into())
    }

    /// Construct [`LyricReelError::FontLoad`].
    pub fn font_load(msg: impl Into<String>) -> Self {
        Self::FontLoad(msg.into())
    }

    /// Construct [`LyricReelError::Render`].
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Construct [`LyricReelError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
