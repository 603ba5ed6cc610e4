//! OpenTSDB timestamp unit handling.

/// Bit mask covering the upper half of the 63-bit signed range.
///
/// Second-precision timestamps (below ~2^31 seconds of epoch magnitude)
/// leave these bits zero; millisecond-precision ones do not. Inherited from
/// OpenTSDB's `IncomingDataPoints.addPointInternal` and reproduced
/// bit-for-bit, boundary imprecision included.
pub const SECOND_MASK: i64 = 0x7FFF_FFFF_0000_0000;

/// Normalize an OpenTSDB timestamp to milliseconds since epoch.
///
/// Values that look like seconds are multiplied by 1000; values already in
/// milliseconds pass through unchanged. The mask ignores bit 63, so inputs
/// like `i64::MIN` take the seconds path; the multiply wraps rather than
/// panics, keeping OpenTSDB's two's-complement arithmetic.
pub fn to_millis(ts: i64) -> i64 {
    if ts & SECOND_MASK == 0 {
        ts.wrapping_mul(1000)
    } else {
        ts
    }
}
