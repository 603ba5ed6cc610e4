//! OpenTSDB HTTP JSON row parsing.
//!
//! This module parses the body format of the OpenTSDB `/api/put` endpoint:
//! a single row object or an array of row objects. See
//! <http://opentsdb.net/docs/build/html/api_http/put.html>.

use serde_json::Value;
use tsdbpush_core::{
    error::{IngestError, IngestResult},
    row::Rows,
    timestamp::to_millis,
};

/// Unmarshal OpenTSDB HTTP rows from a parsed JSON body into `rows`,
/// appending to any existing content.
///
/// On failure the arena holds partial, undefined content; the caller must
/// discard the whole request rather than insert it.
pub fn unmarshal(rows: &mut Rows, av: &Value) -> IngestResult<()> {
    match av {
        Value::Object(_) => unmarshal_row(rows, av),
        Value::Array(items) => {
            for item in items {
                unmarshal_row(rows, item)?;
            }
            Ok(())
        }
        Value::Null => Err(IngestError::parse("cannot unmarshal body, it is empty")),
        other => Err(IngestError::parse(format!(
            "cannot unmarshal body, type is not object or array: {other}"
        ))),
    }
}

fn unmarshal_row(rows: &mut Rows, o: &Value) -> IngestResult<()> {
    let metric = o
        .get("metric")
        .and_then(Value::as_str)
        .ok_or_else(|| IngestError::parse(format!("missing `metric` field in {o}")))?;

    let raw_ts = o
        .get("timestamp")
        .ok_or_else(|| IngestError::parse(format!("missing `timestamp` field in {o}")))?;
    let ts = match raw_ts.as_i64() {
        Some(ts) => ts,
        None => {
            // Fractional timestamps are probably milliseconds already;
            // truncated after scaling, sub-millisecond precision is lost.
            let ts_f = raw_ts.as_f64().ok_or_else(|| {
                IngestError::parse(format!("invalid `timestamp` field in {o}"))
            })?;
            (ts_f * 1000.0) as i64
        }
    };
    let ts = to_millis(ts);

    let value = match o.get("value") {
        Some(raw) => raw
            .as_f64()
            .ok_or_else(|| IngestError::parse(format!("invalid `value` field in {o}")))?,
        None => {
            return Err(IngestError::parse(format!("missing `value` field in {o}")));
        }
    };

    let tags = o
        .get("tags")
        .and_then(Value::as_object)
        .ok_or_else(|| IngestError::parse(format!("missing `tags` field in {o}")))?;

    let mark = rows.tag_mark();
    for (key, raw) in tags {
        // Non-string tag values are dropped, not an error.
        if let Some(value) = raw.as_str() {
            rows.push_tag(key, value);
        }
    }
    let range = rows.tag_range_from(mark);

    rows.push_row(metric, ts, value, range);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(v: Value) -> Result<Rows, IngestError> {
        let mut rows = Rows::new();
        unmarshal(&mut rows, &v).map(|_| rows)
    }

    #[test]
    fn test_single_object() {
        let rows = parse(json!({
            "metric": "sys.cpu",
            "timestamp": 1_577_836_800_000i64,
            "value": 42.5,
            "tags": {"host": "web01", "dc": "us"}
        }))
        .unwrap();

        assert_eq!(rows.len(), 1);
        let r = &rows.rows()[0];
        assert_eq!(r.metric, "sys.cpu");
        assert_eq!(r.timestamp, 1_577_836_800_000);
        assert_eq!(r.value, 42.5);
        let tags = rows.tags(r.tags);
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].key, "dc");
        assert_eq!(tags[0].value, "us");
        assert_eq!(tags[1].key, "host");
        assert_eq!(tags[1].value, "web01");
    }

    #[test]
    fn test_array_of_objects() {
        let rows = parse(json!([
            {"metric": "m1", "timestamp": 1_577_836_800_000i64, "value": 1, "tags": {"a": "1"}},
            {"metric": "m2", "timestamp": 1_577_836_801_000i64, "value": 2, "tags": {"b": "2"}}
        ]))
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows.rows()[0].metric, "m1");
        assert_eq!(rows.rows()[1].metric, "m2");
    }

    #[test]
    fn test_root_type_error() {
        let err = parse(json!("put sys.cpu")).unwrap_err();
        assert!(err.to_string().contains("type is not object or array"));
        let err = parse(json!(42)).unwrap_err();
        assert!(err.to_string().contains("type is not object or array"));
    }

    #[test]
    fn test_seconds_timestamp_is_scaled() {
        let rows = parse(json!({
            "metric": "m", "timestamp": 1_000_000_000, "value": 1, "tags": {"a": "1"}
        }))
        .unwrap();
        assert_eq!(rows.rows()[0].timestamp, 1_000_000_000_000);
    }

    #[test]
    fn test_millis_timestamp_is_unchanged() {
        let rows = parse(json!({
            "metric": "m", "timestamp": 1_577_836_800_000i64, "value": 1, "tags": {"a": "1"}
        }))
        .unwrap();
        assert_eq!(rows.rows()[0].timestamp, 1_577_836_800_000);
    }

    #[test]
    fn test_fractional_timestamp_is_treated_as_millis() {
        // Float path: scaled by 1000 once, truncated; the integer-path
        // seconds heuristic does not reapply.
        let rows = parse(json!({
            "metric": "m", "timestamp": 1_577_836_800.123, "value": 1, "tags": {"a": "1"}
        }))
        .unwrap();
        assert_eq!(rows.rows()[0].timestamp, 1_577_836_800_123);
    }

    #[test]
    fn test_missing_fields() {
        for (body, field) in [
            (json!({"timestamp": 1, "value": 1.0, "tags": {}}), "metric"),
            (json!({"metric": "m", "value": 1.0, "tags": {}}), "timestamp"),
            (json!({"metric": "m", "timestamp": 1, "tags": {}}), "value"),
            (json!({"metric": "m", "timestamp": 1, "value": 1.0}), "tags"),
        ] {
            let err = parse(body).unwrap_err();
            assert!(
                err.to_string().contains(&format!("`{field}`")),
                "error should name `{field}`: {err}"
            );
        }
    }

    #[test]
    fn test_invalid_timestamp_and_value() {
        let err = parse(json!({
            "metric": "m", "timestamp": "soon", "value": 1, "tags": {}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("invalid `timestamp`"));

        let err = parse(json!({
            "metric": "m", "timestamp": 1, "value": "big", "tags": {}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("invalid `value`"));
    }

    #[test]
    fn test_non_string_tag_values_are_dropped() {
        let rows = parse(json!({
            "metric": "m",
            "timestamp": 1_577_836_800_000i64,
            "value": 1,
            "tags": {"host": "web01", "port": 4242, "up": true}
        }))
        .unwrap();

        let r = &rows.rows()[0];
        let tags = rows.tags(r.tags);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].key, "host");
    }

    #[test]
    fn test_failed_row_aborts_batch() {
        let mut rows = Rows::new();
        let v = json!([
            {"metric": "ok", "timestamp": 1, "value": 1.0, "tags": {}},
            {"timestamp": 2, "value": 2.0, "tags": {}}
        ]);
        assert!(unmarshal(&mut rows, &v).is_err());
        // Partial content is undefined; the caller resets before reuse.
        rows.reset();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_round_trip_text_identity() {
        let rows = parse(json!({
            "metric": "ключ.metric-δ",
            "timestamp": 1_577_836_800_000i64,
            "value": 1,
            "tags": {"täg": "välue=with=equals"}
        }))
        .unwrap();

        let r = &rows.rows()[0];
        assert_eq!(r.metric, "ключ.metric-δ");
        let tags = rows.tags(r.tags);
        assert_eq!(tags[0].key, "täg");
        assert_eq!(tags[0].value, "välue=with=equals");
    }
}
