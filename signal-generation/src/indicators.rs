// Indicator Layer
// Stateless numeric primitives over a closing-price sequence

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum IndicatorError {
    #[error("indicator period must be at least 1")]
    ZeroPeriod,

    #[error("non-finite close {value} at index {index}")]
    NonFinite { index: usize, value: f64 },
}

/// `Ok(None)` means the indicator is undefined for this input (too short).
pub type IndicatorResult = Result<Option<f64>, IndicatorError>;

fn trailing(closes: &[f64], count: usize) -> Result<&[f64], IndicatorError> {
    let start = closes.len() - count;
    let window = &closes[start..];
    if let Some((offset, value)) = window.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(IndicatorError::NonFinite {
            index: start + offset,
            value: *value,
        });
    }
    Ok(window)
}

/// Simple moving average of the trailing `period` closes.
pub fn sma(closes: &[f64], period: usize) -> IndicatorResult {
    if period == 0 {
        return Err(IndicatorError::ZeroPeriod);
    }
    if closes.len() < period {
        return Ok(None);
    }

    let window = trailing(closes, period)?;
    Ok(Some(window.iter().sum::<f64>() / period as f64))
}

/// Exponential moving average, seeded with the SMA of the first `period`
/// closes and smoothed with `alpha = 2 / (period + 1)`.
pub fn ema(closes: &[f64], period: usize) -> IndicatorResult {
    if period == 0 {
        return Err(IndicatorError::ZeroPeriod);
    }
    if closes.len() < period {
        return Ok(None);
    }

    let values = trailing(closes, closes.len())?;
    let alpha = 2.0 / (period as f64 + 1.0);
    let seed = values[..period].iter().sum::<f64>() / period as f64;
    let value = values[period..]
        .iter()
        .fold(seed, |prev, close| alpha * close + (1.0 - alpha) * prev);
    Ok(Some(value))
}

/// Wilder's relative strength index over the whole series, scaled to
/// [0, 100]. Needs `period + 1` closes.
///
/// Average gain and loss are seeded with the simple mean of the first
/// `period` changes, then smoothed as `avg = (prev * (period - 1) + cur) / period`
/// for every later change. No losses saturates at 100, no gains at 0; a flat
/// series reads as neutral 50.
pub fn rsi(closes: &[f64], period: usize) -> IndicatorResult {
    if period == 0 {
        return Err(IndicatorError::ZeroPeriod);
    }
    if closes.len() < period + 1 {
        return Ok(None);
    }

    let values = trailing(closes, closes.len())?;
    let p = period as f64;
    let mut changes = values.windows(2).map(|pair| pair[1] - pair[0]);

    let (gains, losses) = changes
        .by_ref()
        .take(period)
        .fold((0.0, 0.0), |(gains, losses), change: f64| {
            (gains + change.max(0.0), losses + (-change).max(0.0))
        });
    let (mut avg_gain, mut avg_loss) = (gains / p, losses / p);
    for change in changes {
        avg_gain = (avg_gain * (p - 1.0) + change.max(0.0)) / p;
        avg_loss = (avg_loss * (p - 1.0) + (-change).max(0.0)) / p;
    }

    let value = match (avg_gain > 0.0, avg_loss > 0.0) {
        (false, false) => 50.0,
        (true, false) => 100.0,
        (false, true) => 0.0,
        (true, true) => 100.0 - 100.0 / (1.0 + avg_gain / avg_loss),
    };
    Ok(Some(value))
}
