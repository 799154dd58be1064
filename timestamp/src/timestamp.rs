use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime as ODT, UtcOffset};

pub use kind::{Decode, Instant, ParseError, ZERO};

/// How the layout is named in errors.
pub const LAYOUT_NAME: &str = "RFC 3339";

pub const DEFAULT: TimestampKind = TimestampKind(ZERO);

/// A point in time with a fixed UTC offset, parsed and formatted as RFC 3339.
///
/// The offset is kept exactly as parsed. Equality and hashing go by the
/// instant alone, so `15:04:05-03:00` and `18:04:05Z` on the same day are
/// equal even though they format differently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct TimestampKind(ODT);

/// An instant that has no RFC 3339 form, such as one before year 0 or with
/// an offset that is not a whole number of minutes.
#[derive(Debug, thiserror::Error)]
#[error("{instant} has no RFC 3339 form")]
pub struct OutOfRange {
    instant: ODT,
    #[source]
    source: time::error::Format,
}

/// Parses `text` as a [`TimestampKind`].
///
/// `""` gives [`DEFAULT`]. Anything else has to be a full RFC 3339 date-time
/// with an upper case `T` separator, ending in `Z` or a numeric `±HH:MM`
/// offset; local times without an offset are rejected, and so is second 60.
pub fn parse_timestamp(text: &str) -> Result<TimestampKind, ParseError> {
    if text.is_empty() {
        return Ok(DEFAULT);
    }

    // The `time` parser also takes a space or lower case `t`/`z`, and folds a
    // leap second into the second before it.
    let bytes = text.as_bytes();
    if bytes.get(10) != Some(&b'T')
        || bytes.last() == Some(&b'z')
        || bytes.get(17..19) == Some(&b"60"[..])
    {
        return Err(ParseError::malformed(text, LAYOUT_NAME));
    }

    ODT::parse(text, &Rfc3339)
        .map(TimestampKind)
        .map_err(|e| ParseError::new(text, LAYOUT_NAME, e))
}

impl TimestampKind {
    /// Whether this is exactly `0001-01-01T00:00:00Z`, the "not set" instant.
    pub fn is_zero(&self) -> bool {
        self.0 == ZERO
    }

    pub fn as_instant(&self) -> ODT {
        self.0
    }

    pub fn offset(&self) -> UtcOffset {
        self.0.offset()
    }

    /// Same as the `Display` output.
    pub fn format(&self) -> String {
        self.to_string()
    }
}

impl Default for TimestampKind {
    fn default() -> Self {
        DEFAULT
    }
}

impl core::fmt::Display for TimestampKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        kind::write_formatted(f, |w| self.0.format_into(w, &Rfc3339))
    }
}

impl core::str::FromStr for TimestampKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_timestamp(s)
    }
}

impl Instant for TimestampKind {
    fn as_instant(&self) -> ODT {
        self.0
    }
}

impl Decode for TimestampKind {
    fn decode(&mut self, text: &str) -> Result<(), ParseError> {
        match parse_timestamp(text) {
            Ok(timestamp) => {
                tracing::trace!(%timestamp, "decoded timestamp");
                *self = timestamp;
                Ok(())
            }
            Err(error) => {
                tracing::debug!(input = text, %error, "rejected timestamp");
                Err(error)
            }
        }
    }
}

impl TryFrom<ODT> for TimestampKind {
    type Error = OutOfRange;

    fn try_from(instant: ODT) -> Result<Self, Self::Error> {
        instant
            .format_into(&mut std::io::sink(), &Rfc3339)
            .map(|_| Self(instant))
            .map_err(|source| OutOfRange { instant, source })
    }
}

impl From<TimestampKind> for ODT {
    fn from(timestamp: TimestampKind) -> Self {
        timestamp.0
    }
}

#[cfg(any(feature = "serde", test))]
impl serde::Serialize for TimestampKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(any(feature = "serde", test))]
impl<'de> serde::Deserialize<'de> for TimestampKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        <String as serde::Deserialize>::deserialize(deserializer)?
            .parse::<Self>()
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use std::hash::Hash;

    use test_case::test_case;
    use time::macros::{datetime, offset};

    use super::*;

    static_assertions::assert_impl_all!(
        TimestampKind: core::fmt::Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Send, Sync,
        core::fmt::Display, core::str::FromStr, Decode, Instant, TryFrom<ODT>
    );
    static_assertions::assert_impl_all!(OutOfRange: Send, Sync, std::error::Error);

    fn parse(text: &str) -> TimestampKind {
        parse_timestamp(text).unwrap()
    }

    #[test_case("2006-01-02T15:04:05-03:00", datetime!(2006-01-02 15:04:05 -3) ; "negative offset")]
    #[test_case("2006-01-02T15:04:05+05:30", datetime!(2006-01-02 15:04:05 +5:30) ; "half hour offset")]
    #[test_case("2006-01-02T15:04:05Z", datetime!(2006-01-02 15:04:05 UTC) ; "utc")]
    #[test_case("2006-01-02T15:04:05.123Z", datetime!(2006-01-02 15:04:05.123 UTC) ; "fraction")]
    #[test_case("0001-01-01T00:00:00Z", datetime!(0001-01-01 0:00 UTC) ; "zero")]
    fn parse_keeps_offset(text: &str, want: ODT) {
        let timestamp = parse(text);

        assert_eq!(timestamp.as_instant(), want);
        assert_eq!(timestamp.offset(), want.offset());
    }

    #[test_case("2006-01-02T00:00:00" ; "no offset")]
    #[test_case("2006-01-02" ; "date only")]
    #[test_case("15:04:05Z" ; "time only")]
    #[test_case("2006-01-02T15:04Z" ; "no seconds")]
    #[test_case("2006-01-02T25:04:05Z" ; "hour twenty five")]
    #[test_case("2006-02-30T15:04:05Z" ; "day past end of month")]
    #[test_case("2006-01-02T15:04:05+0300" ; "offset without colon")]
    #[test_case("2006-01-02T15:04:05.Z" ; "empty fraction")]
    #[test_case("20060102T150405Z" ; "basic format")]
    #[test_case("0000-00-00" ; "date placeholder")]
    #[test_case("not a timestamp" ; "garbage")]
    #[test_case("2006-01-02 15:04:05Z" ; "space separator")]
    #[test_case("2006-01-02t15:04:05Z" ; "lower case separator")]
    #[test_case("2006-01-02T15:04:05z" ; "lower case utc")]
    #[test_case("2006-12-31T23:59:60Z" ; "leap second")]
    #[test_case("2006-12-31T23:59:60.5+03:00" ; "leap second with fraction")]
    fn parse_err(text: &str) {
        let err = parse_timestamp(text).unwrap_err();

        assert_eq!(err.input(), text);
        assert_eq!(err.layout(), "RFC 3339");
        assert_eq!(err.to_string(), format!("cannot parse {text:?} as RFC 3339"));
    }

    #[test_case("2006-01-02T15:04:05-03:00" ; "negative offset")]
    #[test_case("2006-01-02T15:04:05+03:00" ; "positive offset")]
    #[test_case("2006-01-02T15:04:05Z" ; "utc")]
    #[test_case("2006-01-02T15:04:05.5+03:00" ; "tenths")]
    #[test_case("2006-01-02T15:04:05.123456789-11:30" ; "nanoseconds")]
    #[test_case("0001-01-01T00:00:00Z" ; "zero")]
    #[test_case("9999-12-31T23:59:59Z" ; "last second")]
    fn format_returns_parsed_text(text: &str) {
        assert_eq!(parse(text).format(), text);
    }

    #[test_case("2006-01-02T15:04:05+00:00" ; "positive zero offset")]
    #[test_case("2006-01-02T15:04:05-00:00" ; "negative zero offset")]
    fn zero_offset_formats_as_utc(text: &str) {
        let timestamp = parse(text);

        assert!(timestamp.offset().is_utc());
        assert_eq!(timestamp.format(), "2006-01-02T15:04:05Z");
    }

    #[test]
    fn empty_is_zero() {
        let timestamp = parse("");

        assert!(timestamp.is_zero());
        assert_eq!(timestamp, DEFAULT);
        assert_eq!(timestamp.format(), "0001-01-01T00:00:00Z");
    }

    #[test_case("0001-01-01T00:00:00Z", true ; "zero")]
    #[test_case("0001-01-01T03:00:00+03:00", true ; "zero seen from another offset")]
    #[test_case("0001-01-01T00:00:00.000000001Z", false ; "one nanosecond past zero")]
    #[test_case("0001-01-01T00:00:01Z", false ; "one second past zero")]
    #[test_case("2006-01-02T15:04:05Z", false ; "regular")]
    fn is_zero(text: &str, want: bool) {
        assert_eq!(parse(text).is_zero(), want);
    }

    #[test]
    fn same_instant_different_offsets() {
        let local = parse("2006-01-02T15:04:05-03:00");
        let utc = parse("2006-01-02T18:04:05Z");

        assert_eq!(local, utc);
        assert_ne!(local.format(), utc.format());
        assert_eq!(local.offset(), offset!(-3));
    }

    #[test]
    fn missing_value_reads_as_zero() {
        let missing: Option<&TimestampKind> = None;
        assert_eq!(missing.as_instant(), ZERO);

        let present = parse("2006-01-02T15:04:05-03:00");
        assert_eq!(Some(&present).as_instant(), datetime!(2006-01-02 15:04:05 -3));
    }

    #[test_case("", DEFAULT ; "empty")]
    #[test_case("2006-01-02T15:04:05-03:00", parse("2006-01-02T15:04:05-03:00") ; "offset")]
    #[test_case("2006-01-02T15:04:05Z", parse("2006-01-02T15:04:05Z") ; "utc")]
    fn decode_ok(text: &str, want: TimestampKind) {
        let mut got = parse("1999-12-31T23:59:59Z");

        let target: &mut dyn Decode = &mut got;
        target.decode(text).unwrap();

        assert_eq!(got, want);
        assert_eq!(got.offset(), want.offset());
    }

    #[test_case("2006-01-02T00:00:00" ; "no offset")]
    #[test_case("2006-01-02" ; "date only")]
    #[test_case("0000-00-00" ; "date placeholder")]
    fn decode_err_leaves_value(text: &str) {
        let before = parse("2006-01-02T15:04:05+03:00");
        let mut got = before;

        got.decode(text).unwrap_err();

        assert_eq!(got, before);
        assert_eq!(got.format(), "2006-01-02T15:04:05+03:00");
    }

    #[test]
    fn try_from_representable() {
        let instant = datetime!(2006-01-02 15:04:05 -3);
        let timestamp = TimestampKind::try_from(instant).unwrap();

        assert_eq!(ODT::from(timestamp), instant);
        assert_eq!(timestamp.format(), "2006-01-02T15:04:05-03:00");
    }

    #[test_case(datetime!(-0001-12-31 0:00 UTC) ; "before year zero")]
    #[test_case(datetime!(2006-01-02 15:04:05 +1:00:30) ; "offset with seconds")]
    fn try_from_out_of_range(instant: ODT) {
        let err = TimestampKind::try_from(instant).unwrap_err();

        assert!(err.to_string().ends_with("has no RFC 3339 form"));
    }

    #[test]
    fn serde_uses_text_form() {
        #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
        struct Config {
            created: TimestampKind,
            deleted: TimestampKind,
        }

        let config = Config {
            created: parse("2006-01-02T15:04:05-03:00"),
            deleted: TimestampKind::default(),
        };

        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(
            json,
            r#"{"created":"2006-01-02T15:04:05-03:00","deleted":"0001-01-01T00:00:00Z"}"#
        );

        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
        assert_eq!(parsed.created.offset(), offset!(-3));

        let empty: Config = serde_json::from_str(r#"{"created":"","deleted":""}"#).unwrap();
        assert!(empty.created.is_zero());

        serde_json::from_str::<Config>(r#"{"created":"2006-01-02T00:00:00","deleted":""}"#)
            .unwrap_err();
    }
}
