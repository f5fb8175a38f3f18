//! MarketSeries: the validated, read-only frame sequence behind an episode.

use thiserror::Error;

use super::frame::MarketFrame;

/// Minimum number of frames: an episode needs a start and at least one step.
pub const MIN_SERIES_LEN: usize = 2;

/// Validation failures for a frame sequence.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("series has {len} frame(s); at least {MIN_SERIES_LEN} are required")]
    TooShort { len: usize },

    #[error("frame {index} has a non-finite {field}")]
    NonFinite { index: usize, field: &'static str },

    #[error("frame {index} has non-positive close price {close}")]
    NonPositiveClose { index: usize, close: f64 },

    #[error("frame {index} date {date} is not after the previous frame")]
    UnorderedDates { index: usize, date: chrono::NaiveDate },
}

/// Ordered, validated sequence of market frames for one instrument.
///
/// Once built the series is immutable. Environments share it through
/// `Arc<MarketSeries>`.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSeries {
    symbol: String,
    frames: Vec<MarketFrame>,
}

impl MarketSeries {
    /// Validate and wrap a frame sequence.
    pub fn new(symbol: impl Into<String>, frames: Vec<MarketFrame>) -> Result<Self, SeriesError> {
        validate_frames(&frames)?;
        Ok(Self {
            symbol: symbol.into(),
            frames,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn frames(&self) -> &[MarketFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always false for a validated series; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MarketFrame> {
        self.frames.get(index)
    }

    /// Last valid step index (`len - 1`).
    pub fn last_index(&self) -> usize {
        self.frames.len() - 1
    }

    pub fn first(&self) -> &MarketFrame {
        &self.frames[0]
    }

    pub fn last(&self) -> &MarketFrame {
        &self.frames[self.last_index()]
    }

    /// Close prices in step order.
    pub fn closes(&self) -> Vec<f64> {
        self.frames.iter().map(|f| f.close_price).collect()
    }

    pub fn into_frames(self) -> Vec<MarketFrame> {
        self.frames
    }
}

fn validate_frames(frames: &[MarketFrame]) -> Result<(), SeriesError> {
    if frames.len() < MIN_SERIES_LEN {
        return Err(SeriesError::TooShort { len: frames.len() });
    }
    for (index, frame) in frames.iter().enumerate() {
        if let Some(field) = frame.first_non_finite() {
            return Err(SeriesError::NonFinite { index, field });
        }
        if frame.close_price <= 0.0 {
            return Err(SeriesError::NonPositiveClose {
                index,
                close: frame.close_price,
            });
        }
        if index > 0 && frame.date <= frames[index - 1].date {
            return Err(SeriesError::UnorderedDates {
                index,
                date: frame.date,
            });
        }
    }
    Ok(())
}

/// Daily frames from close prices with neutral indicators, starting
/// 2024-01-02. For scripted scenarios where only prices matter.
pub fn frames_from_closes(closes: &[f64]) -> Vec<MarketFrame> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap_or_default();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| MarketFrame::flat(base + chrono::Duration::days(i as i64), close))
        .collect()
}
