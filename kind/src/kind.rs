//! Pieces shared by the date and timestamp kinds: the "not set" instant, the
//! decode capability, and the error both kinds report.

use time::OffsetDateTime as ODT;

/// The instant that stands for "not set": `0001-01-01T00:00:00Z`.
pub const ZERO: ODT = time::macros::datetime!(0001-01-01 0:00 UTC);

/// A value that can be replaced in place by decoding raw text, such as the
/// contents of an environment variable or a config field.
///
/// Implementations must leave `self` untouched when they return an error.
pub trait Decode {
    fn decode(&mut self, text: &str) -> Result<(), ParseError>;
}

/// Read access to the instant a kind holds.
pub trait Instant {
    fn as_instant(&self) -> ODT;
}

impl<T: Instant + ?Sized> Instant for &T {
    fn as_instant(&self) -> ODT {
        (**self).as_instant()
    }
}

/// A missing value reads as [`ZERO`].
impl<T: Instant> Instant for Option<T> {
    fn as_instant(&self) -> ODT {
        match self {
            Some(kind) => kind.as_instant(),
            None => ZERO,
        }
    }
}

/// Text that does not match the layout a kind expects.
#[derive(Debug, thiserror::Error)]
#[error("cannot parse {input:?} as {layout}")]
pub struct ParseError {
    input: String,
    layout: &'static str,
    #[source]
    source: Option<time::error::Parse>,
}

impl ParseError {
    pub fn new(
        input: impl Into<String>,
        layout: &'static str,
        source: time::error::Parse,
    ) -> Self {
        Self {
            input: input.into(),
            layout,
            source: Some(source),
        }
    }

    /// For input rejected before it reaches the `time` parser.
    pub fn malformed(input: impl Into<String>, layout: &'static str) -> Self {
        Self {
            input: input.into(),
            layout,
            source: None,
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn layout(&self) -> &'static str {
        self.layout
    }
}

/// Lets `time`'s `format_into` write into a [`core::fmt::Formatter`] without
/// going through an intermediate `String`.
pub struct FmtWriter<'refr, 'f>(pub &'refr mut core::fmt::Formatter<'f>);

impl std::io::Write for FmtWriter<'_, '_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let len = buf.len();

        self.0.write_str(
            std::str::from_utf8(buf)
                .map_err(std::io::Error::other)?
        ).map_err(std::io::Error::other)?;

        Ok(len)
    }
    fn flush(&mut self) -> std::io::Result<()> { Ok(()) }
}

/// Runs `format` against `f`, folding `time`'s format error into
/// [`core::fmt::Error`].
pub fn write_formatted(
    f: &mut core::fmt::Formatter<'_>,
    format: impl FnOnce(&mut FmtWriter<'_, '_>) -> Result<usize, time::error::Format>,
) -> core::fmt::Result {
    format(&mut FmtWriter(f))
        .map(|_| ())
        .map_err(|_| core::fmt::Error)
}
