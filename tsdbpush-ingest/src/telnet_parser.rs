//! OpenTSDB telnet `put` row parsing.
//!
//! Parses newline-separated `put <metric> <ts> <value> <k>=<v> ...` lines.
//! See <http://opentsdb.net/docs/build/html/api_telnet/put.html>.
//!
//! Numeric tokens use a best-effort parse that tolerates trailing garbage
//! and yields 0 instead of failing; this is a deliberate trade-off for the
//! line format and differs from the strict JSON parser.

use tsdbpush_core::{
    error::{IngestError, IngestResult},
    row::Rows,
    timestamp::to_millis,
};

/// Unmarshal telnet `put` rows from `s` into `rows`, appending to any
/// existing content. Blank lines are skipped without error.
///
/// On failure the arena holds partial, undefined content; the caller must
/// discard the whole request rather than insert it.
pub fn unmarshal(rows: &mut Rows, s: &str) -> IngestResult<()> {
    for line in s.split('\n') {
        if line.is_empty() {
            continue;
        }
        unmarshal_row(rows, line).map_err(|err| {
            IngestError::parse(format!("cannot unmarshal OpenTSDB line {line:?}: {err}"))
        })?;
    }
    Ok(())
}

fn unmarshal_row(rows: &mut Rows, line: &str) -> IngestResult<()> {
    let s = line
        .strip_prefix("put ")
        .ok_or_else(|| IngestError::parse(format!("missing `put ` prefix in {line:?}")))?;

    let n = s.find(' ').ok_or_else(|| {
        IngestError::parse(format!(
            "cannot find whitespace between metric and timestamp in {s:?}"
        ))
    })?;
    let metric = &s[..n];
    let tail = &s[n + 1..];

    let n = tail.find(' ').ok_or_else(|| {
        IngestError::parse(format!(
            "cannot find whitespace between timestamp and value in {s:?}"
        ))
    })?;
    let timestamp = to_millis(parse_best_effort(&tail[..n]) as i64);
    let tail = &tail[n + 1..];

    let n = tail.find(' ').ok_or_else(|| {
        IngestError::parse(format!(
            "cannot find whitespace between value and the first tag in {s:?}"
        ))
    })?;
    let value = parse_best_effort(&tail[..n]);

    let mark = rows.tag_mark();
    for pair in tail[n + 1..].split(' ') {
        let eq = pair
            .find('=')
            .ok_or_else(|| IngestError::parse(format!("missing tag value for {pair:?}")))?;
        let key = &pair[..eq];
        if key.is_empty() {
            return Err(IngestError::parse(format!(
                "tag key cannot be empty for {pair:?}"
            )));
        }
        // The tag value is not validated further; it may be empty or
        // contain further `=`.
        rows.push_tag(key, &pair[eq + 1..]);
    }
    let range = rows.tag_range_from(mark);

    rows.push_row(metric, timestamp, value, range);
    Ok(())
}

/// Best-effort float parse: consumes a leading numeric prefix, ignores
/// trailing garbage, and yields 0 when no number is present.
pub fn parse_best_effort(s: &str) -> f64 {
    let b = s.as_bytes();
    let mut i = 0;
    if i < b.len() && (b[i] == b'+' || b[i] == b'-') {
        i += 1;
    }
    let digits_start = i;
    while i < b.len() && b[i].is_ascii_digit() {
        i += 1;
    }
    let mut saw_digit = i > digits_start;
    if i < b.len() && b[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        saw_digit |= i > frac_start;
    }
    if !saw_digit {
        return 0.0;
    }
    if i < b.len() && (b[i] == b'e' || b[i] == b'E') {
        let mut j = i + 1;
        if j < b.len() && (b[j] == b'+' || b[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < b.len() && b[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }
    s[..i].parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Result<Rows, IngestError> {
        let mut rows = Rows::new();
        unmarshal(&mut rows, s).map(|_| rows)
    }

    #[test]
    fn test_single_line() {
        let rows = parse("put sys.cpu 1577836800 42.5 host=web01 dc=us\n").unwrap();

        assert_eq!(rows.len(), 1);
        let r = &rows.rows()[0];
        assert_eq!(r.metric, "sys.cpu");
        assert_eq!(r.timestamp, 1_577_836_800_000);
        assert_eq!(r.value, 42.5);
        let tags = rows.tags(r.tags);
        assert_eq!(tags.len(), 2);
        assert_eq!((tags[0].key.as_str(), tags[0].value.as_str()), ("host", "web01"));
        assert_eq!((tags[1].key.as_str(), tags[1].value.as_str()), ("dc", "us"));
    }

    #[test]
    fn test_multiple_lines_and_no_trailing_newline() {
        let rows = parse("put a 1 1 x=1\nput b 2 2 y=2").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.rows()[1].metric, "b");
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let rows = parse("put a 1 1 x=1\n\nput b 2 2 y=2\n").unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_missing_put_prefix() {
        let err = parse("get sys.cpu 1 1 x=1\n").unwrap_err();
        assert!(err.to_string().contains("missing `put ` prefix"));
    }

    #[test]
    fn test_missing_separators() {
        let err = parse("put sys.cpu\n").unwrap_err();
        assert!(err.to_string().contains("between metric and timestamp"));

        let err = parse("put sys.cpu 1577836800\n").unwrap_err();
        assert!(err.to_string().contains("between timestamp and value"));

        let err = parse("put sys.cpu 1577836800 42.5\n").unwrap_err();
        assert!(err.to_string().contains("between value and the first tag"));
    }

    #[test]
    fn test_tag_errors() {
        let err = parse("put m 1 1 hostweb01\n").unwrap_err();
        assert!(err.to_string().contains("missing tag value"));

        let err = parse("put m 1 1 =web01\n").unwrap_err();
        assert!(err.to_string().contains("tag key cannot be empty"));
    }

    #[test]
    fn test_tag_value_unvalidated() {
        let rows = parse("put m 1 1 empty= eq=a=b\n").unwrap();
        let tags = rows.tags(rows.rows()[0].tags);
        assert_eq!(tags[0].value, "");
        assert_eq!(tags[1].value, "a=b");
    }

    #[test]
    fn test_millis_timestamp_passes_through() {
        let rows = parse("put m 1577836800000 1 x=1\n").unwrap();
        assert_eq!(rows.rows()[0].timestamp, 1_577_836_800_000);
    }

    #[test]
    fn test_best_effort_numbers() {
        assert_eq!(parse_best_effort("42.5"), 42.5);
        assert_eq!(parse_best_effort("-3"), -3.0);
        assert_eq!(parse_best_effort("1.5e3"), 1500.0);
        assert_eq!(parse_best_effort("123garbage"), 123.0);
        assert_eq!(parse_best_effort("2.5e"), 2.5);
        assert_eq!(parse_best_effort("nonsense"), 0.0);
        assert_eq!(parse_best_effort(""), 0.0);
        assert_eq!(parse_best_effort("-"), 0.0);
    }

    #[test]
    fn test_unparsable_numbers_yield_zero_row() {
        let rows = parse("put m notatime notavalue x=1\n").unwrap();
        let r = &rows.rows()[0];
        assert_eq!(r.timestamp, 0);
        assert_eq!(r.value, 0.0);
    }
}
