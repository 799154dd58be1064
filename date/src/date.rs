use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime as ODT, Time};

pub use kind::{Decode, Instant, ParseError, ZERO};

/// How the layout is named in errors.
pub const LAYOUT_NAME: &str = "YYYY-MM-DD";

const LAYOUT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Accepted in place of an empty string to mean "not set".
const PLACEHOLDER: &str = "0000-00-00";

pub const DEFAULT: DateKind = DateKind(ZERO);

/// A calendar date, parsed as `YYYY-MM-DD` at midnight UTC.
///
/// Whenever the value is read, the wrapped instant is cut back to the last
/// UTC midnight and then shown in its own offset, so two values holding
/// different times on the same UTC day read back identically. Equality still
/// compares the wrapped instants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct DateKind(ODT);

/// Parses `text` as a [`DateKind`].
///
/// `""` and `"0000-00-00"` both give [`DEFAULT`]. Anything else has to be
/// exactly `YYYY-MM-DD` and name a real calendar day.
pub fn parse_date(text: &str) -> Result<DateKind, ParseError> {
    match text {
        "" | PLACEHOLDER => Ok(DEFAULT),
        // `[year]` on its own would also take a leading sign.
        _ if text.len() != LAYOUT_NAME.len()
            || !text.starts_with(|c: char| c.is_ascii_digit()) =>
        {
            Err(ParseError::malformed(text, LAYOUT_NAME))
        }
        _ => Date::parse(text, LAYOUT)
            .map(|date| DateKind(date.midnight().assume_utc()))
            .map_err(|e| ParseError::new(text, LAYOUT_NAME, e)),
    }
}

impl DateKind {
    /// Whether this reads back as `0001-01-01`, the "not set" date.
    pub fn is_zero(&self) -> bool {
        self.truncated() == ZERO
    }

    /// The held instant cut back to midnight UTC, in the held offset.
    pub fn as_instant(&self) -> ODT {
        self.truncated()
    }

    pub fn date(&self) -> Date {
        self.truncated().date()
    }

    /// Same as the `Display` output.
    pub fn format(&self) -> String {
        self.to_string()
    }

    fn truncated(&self) -> ODT {
        let day = Duration::DAY.whole_seconds();
        let days = self.0.unix_timestamp().div_euclid(day);

        // Only instants at the very edge of the supported range fail to
        // convert, and those keep their own calendar day.
        ODT::from_unix_timestamp(days * day)
            .map(|midnight| midnight.to_offset(self.0.offset()))
            .unwrap_or_else(|_| self.0.replace_time(Time::MIDNIGHT))
    }
}

impl Default for DateKind {
    fn default() -> Self {
        DEFAULT
    }
}

impl core::fmt::Display for DateKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        kind::write_formatted(f, |w| self.date().format_into(w, LAYOUT))
    }
}

impl core::str::FromStr for DateKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_date(s)
    }
}

impl Instant for DateKind {
    fn as_instant(&self) -> ODT {
        self.truncated()
    }
}

impl Decode for DateKind {
    fn decode(&mut self, text: &str) -> Result<(), ParseError> {
        match parse_date(text) {
            Ok(date) => {
                tracing::trace!(%date, "decoded date");
                *self = date;
                Ok(())
            }
            Err(error) => {
                tracing::debug!(input = text, %error, "rejected date");
                Err(error)
            }
        }
    }
}

/// Keeps the instant as given; the time of day is dropped on read.
impl From<ODT> for DateKind {
    fn from(instant: ODT) -> Self {
        Self(instant)
    }
}

impl From<DateKind> for ODT {
    fn from(date: DateKind) -> Self {
        date.truncated()
    }
}

impl From<DateKind> for Date {
    fn from(date: DateKind) -> Self {
        date.date()
    }
}

#[cfg(any(feature = "serde", test))]
impl serde::Serialize for DateKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(any(feature = "serde", test))]
impl<'de> serde::Deserialize<'de> for DateKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        <String as serde::Deserialize>::deserialize(deserializer)?
            .parse::<Self>()
            .map_err(serde::de::Error::custom)
    }
}
