// Resampler
// Derives coarser bars from a time-ordered base series

use common::{bucket_start, Bar};

/// Fold `bars` into `stride_secs` buckets.
///
/// Consecutive bars sharing a target bucket collapse into one bar: open of
/// the first, close of the last, extrema for high/low, summed volume. The
/// input is assumed to be time-ordered; it is walked once and never
/// re-sorted. A trailing partial bucket is emitted with whatever bars it has.
pub fn resample(bars: &[Bar], stride_secs: i64) -> Vec<Bar> {
    let mut out: Vec<Bar> = Vec::with_capacity(bars.len());

    for bar in bars {
        let bucket = bucket_start(bar.time, stride_secs);
        match out.last_mut() {
            Some(current) if current.time == bucket => current.absorb(bar),
            _ => out.push(Bar { time: bucket, ..*bar }),
        }
    }

    out
}
