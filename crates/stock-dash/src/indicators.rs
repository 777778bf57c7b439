//! Technical indicator engine
//!
//! Derives moving averages, RSI, MACD and Bollinger Bands from the closing
//! prices of a [`PriceSeries`]. Rolling columns are `None` until their window
//! is full; EMA-based columns are defined from the first bar on.

use serde::Serialize;
use ta::{Next, indicators::ExponentialMovingAverage};

use crate::error::{DashboardError, Result};
use crate::series::PriceSeries;

/// Simple moving average windows
pub const MA_WINDOWS: [usize; 3] = [20, 50, 200];
/// RSI lookback
pub const RSI_PERIOD: usize = 14;
/// MACD fast EMA span
pub const MACD_FAST: usize = 12;
/// MACD slow EMA span
pub const MACD_SLOW: usize = 26;
/// MACD signal line EMA span
pub const MACD_SIGNAL: usize = 9;
/// Bollinger Band window
pub const BOLLINGER_PERIOD: usize = 20;
/// Bollinger Band width in standard deviations
pub const BOLLINGER_K: f64 = 2.0;

/// Named column of an analyzed series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Column {
    #[serde(rename = "Close")]
    Close,
    #[serde(rename = "MA20")]
    Ma20,
    #[serde(rename = "MA50")]
    Ma50,
    #[serde(rename = "MA200")]
    Ma200,
    #[serde(rename = "RSI")]
    Rsi,
    #[serde(rename = "MACD")]
    Macd,
    #[serde(rename = "Signal_Line")]
    SignalLine,
    #[serde(rename = "BB_upper")]
    BbUpper,
    #[serde(rename = "BB_middle")]
    BbMiddle,
    #[serde(rename = "BB_lower")]
    BbLower,
}

impl Column {
    pub fn name(self) -> &'static str {
        match self {
            Self::Close => "Close",
            Self::Ma20 => "MA20",
            Self::Ma50 => "MA50",
            Self::Ma200 => "MA200",
            Self::Rsi => "RSI",
            Self::Macd => "MACD",
            Self::SignalLine => "Signal_Line",
            Self::BbUpper => "BB_upper",
            Self::BbMiddle => "BB_middle",
            Self::BbLower => "BB_lower",
        }
    }
}

/// Indicator columns, index-aligned with the source series
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct IndicatorSet {
    pub ma20: Vec<Option<f64>>,
    pub ma50: Vec<Option<f64>>,
    pub ma200: Vec<Option<f64>>,
    pub rsi: Vec<Option<f64>>,
    pub macd: Vec<f64>,
    pub signal_line: Vec<f64>,
    pub bb_upper: Vec<Option<f64>>,
    pub bb_middle: Vec<Option<f64>>,
    pub bb_lower: Vec<Option<f64>>,
}

/// A price series together with its indicator columns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzedSeries {
    pub series: PriceSeries,
    pub indicators: IndicatorSet,
}

impl AnalyzedSeries {
    /// Values of a column, `None` where undefined
    pub fn column(&self, column: Column) -> Vec<Option<f64>> {
        let ind = &self.indicators;
        match column {
            Column::Close => self.series.bars().iter().map(|b| Some(b.close)).collect(),
            Column::Ma20 => ind.ma20.clone(),
            Column::Ma50 => ind.ma50.clone(),
            Column::Ma200 => ind.ma200.clone(),
            Column::Rsi => ind.rsi.clone(),
            Column::Macd => ind.macd.iter().copied().map(Some).collect(),
            Column::SignalLine => ind.signal_line.iter().copied().map(Some).collect(),
            Column::BbUpper => ind.bb_upper.clone(),
            Column::BbMiddle => ind.bb_middle.clone(),
            Column::BbLower => ind.bb_lower.clone(),
        }
    }
}

/// Compute indicators and attach them to the series
pub fn analyze(series: PriceSeries) -> Result<AnalyzedSeries> {
    let indicators = calculate_technical_indicators(&series)?;
    Ok(AnalyzedSeries { series, indicators })
}

/// Compute every indicator column for a series.
///
/// Fails with [`DashboardError::InvalidInput`] on an empty series or a
/// non-finite close.
pub fn calculate_technical_indicators(series: &PriceSeries) -> Result<IndicatorSet> {
    if series.is_empty() {
        return Err(DashboardError::InvalidInput(format!(
            "{}: no bars to analyze",
            series.symbol()
        )));
    }

    let closes = series.closes();
    if let Some(pos) = closes.iter().position(|c| !c.is_finite()) {
        return Err(DashboardError::InvalidInput(format!(
            "{}: close at index {pos} is missing",
            series.symbol()
        )));
    }

    let [w20, w50, w200] = MA_WINDOWS;
    let ma20 = rolling_mean(&closes, w20)?;
    let ma50 = rolling_mean(&closes, w50)?;
    let ma200 = rolling_mean(&closes, w200)?;

    let rsi = relative_strength_index(&closes, RSI_PERIOD)?;

    let fast = ema(&closes, MACD_FAST)?;
    let slow = ema(&closes, MACD_SLOW)?;
    let macd: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
    let signal_line = ema(&macd, MACD_SIGNAL)?;

    let bb_middle = rolling_mean(&closes, BOLLINGER_PERIOD)?;
    let bb_std = rolling_sample_std(&closes, BOLLINGER_PERIOD)?;
    let (bb_upper, bb_lower) = bb_middle
        .iter()
        .zip(&bb_std)
        .map(|(mean, std)| match (mean, std) {
            (Some(m), Some(s)) => (Some(m + BOLLINGER_K * s), Some(m - BOLLINGER_K * s)),
            _ => (None, None),
        })
        .unzip();

    tracing::debug!(
        symbol = series.symbol(),
        bars = closes.len(),
        "Calculated technical indicators"
    );

    Ok(IndicatorSet {
        ma20,
        ma50,
        ma200,
        rsi,
        macd,
        signal_line,
        bb_upper,
        bb_middle,
        bb_lower,
    })
}

/// Arithmetic mean of each trailing window; `None` until the window is full
pub fn rolling_mean(values: &[f64], window: usize) -> Result<Vec<Option<f64>>> {
    if window == 0 {
        return Err(DashboardError::IndicatorError(
            "window must be greater than 0".to_string(),
        ));
    }

    Ok((0..values.len())
        .map(|i| {
            (i + 1 >= window).then(|| {
                let slice = &values[i + 1 - window..=i];
                slice.iter().sum::<f64>() / window as f64
            })
        })
        .collect())
}

/// Sample standard deviation (n - 1 denominator) of each trailing window
pub fn rolling_sample_std(values: &[f64], window: usize) -> Result<Vec<Option<f64>>> {
    if window < 2 {
        return Err(DashboardError::IndicatorError(
            "sample standard deviation needs a window of at least 2".to_string(),
        ));
    }

    Ok((0..values.len())
        .map(|i| {
            (i + 1 >= window).then(|| {
                let slice = &values[i + 1 - window..=i];
                let mean = slice.iter().sum::<f64>() / window as f64;
                let ss: f64 = slice.iter().map(|x| (x - mean).powi(2)).sum();
                (ss / (window - 1) as f64).sqrt()
            })
        })
        .collect())
}

/// Recursive EMA with `alpha = 2 / (span + 1)`, seeded with the first value
pub fn ema(values: &[f64], span: usize) -> Result<Vec<f64>> {
    let mut ema = ExponentialMovingAverage::new(span)
        .map_err(|e| DashboardError::IndicatorError(e.to_string()))?;
    Ok(values.iter().map(|&v| ema.next(v)).collect())
}

/// RSI from simple rolling means of gains and losses.
///
/// The first bar contributes a change of zero. A window without losses
/// reports 100.
pub fn relative_strength_index(closes: &[f64], period: usize) -> Result<Vec<Option<f64>>> {
    let deltas: Vec<f64> = closes
        .iter()
        .enumerate()
        .map(|(i, c)| if i == 0 { 0.0 } else { c - closes[i - 1] })
        .collect();

    let gains: Vec<f64> = deltas.iter().map(|d| d.max(0.0)).collect();
    let losses: Vec<f64> = deltas.iter().map(|d| (-d).max(0.0)).collect();

    let avg_gain = rolling_mean(&gains, period)?;
    let avg_loss = rolling_mean(&losses, period)?;

    Ok(avg_gain
        .iter()
        .zip(&avg_loss)
        .map(|(gain, loss)| match (gain, loss) {
            (Some(gain), Some(loss)) => Some(rsi_value(*gain, *loss)),
            _ => None,
        })
        .collect())
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss <= 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0)
}

/// Human reading of an RSI level
pub fn interpret_rsi(rsi: f64) -> &'static str {
    if rsi > 70.0 {
        "Overbought"
    } else if rsi < 30.0 {
        "Oversold"
    } else {
        "Neutral"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::fixtures::series_from_closes;

    const EPS: f64 = 1e-9;

    fn wave(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i as f64 * 0.37).sin() * 12.0 + i as f64 * 0.05)
            .collect()
    }

    #[test]
    fn test_moving_averages_match_window_mean() {
        let closes = wave(260);
        let series = series_from_closes("TCS.NS", &closes);
        let ind = calculate_technical_indicators(&series).unwrap();

        for (window, column) in [(20, &ind.ma20), (50, &ind.ma50), (200, &ind.ma200)] {
            assert_eq!(column.len(), closes.len());
            for (i, value) in column.iter().enumerate() {
                if i + 1 < window {
                    assert!(value.is_none(), "MA{window} defined at {i}");
                } else {
                    let expected =
                        closes[i + 1 - window..=i].iter().sum::<f64>() / window as f64;
                    assert!((value.unwrap() - expected).abs() < EPS);
                }
            }
        }
    }

    #[test]
    fn test_rsi_bounds_and_warmup() {
        let series = series_from_closes("TCS.NS", &wave(120));
        let ind = calculate_technical_indicators(&series).unwrap();

        assert!(ind.rsi[..RSI_PERIOD - 1].iter().all(Option::is_none));
        for value in ind.rsi[RSI_PERIOD - 1..].iter() {
            let v = value.unwrap();
            assert!((0.0..=100.0).contains(&v));
        }
    }

    #[test]
    fn test_rsi_all_gains_is_100() {
        let closes: Vec<f64> = (0..30).map(|i| 50.0 + i as f64).collect();
        let rsi = relative_strength_index(&closes, RSI_PERIOD).unwrap();
        for value in rsi.iter().skip(RSI_PERIOD - 1) {
            assert_eq!(value.unwrap(), 100.0);
        }
    }

    #[test]
    fn test_rsi_flat_window_is_100() {
        let rsi = relative_strength_index(&[10.0; 20], RSI_PERIOD).unwrap();
        assert_eq!(rsi[19], Some(100.0));
    }

    #[test]
    fn test_rsi_all_losses_is_0() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        let rsi = relative_strength_index(&closes, RSI_PERIOD).unwrap();
        assert_eq!(rsi[19], Some(0.0));
    }

    #[test]
    fn test_rsi_known_value() {
        // 13 changes: +1 x 7, -1 x 6, plus the zero change of the first bar
        let mut closes = vec![10.0];
        for i in 0..13 {
            let last = *closes.last().unwrap();
            closes.push(if i % 2 == 0 { last + 1.0 } else { last - 1.0 });
        }
        let rsi = relative_strength_index(&closes, RSI_PERIOD).unwrap();
        let expected = 100.0 - 100.0 / (1.0 + 7.0 / 6.0);
        assert!((rsi[13].unwrap() - expected).abs() < EPS);
    }

    #[test]
    fn test_ema_recursive_seeded_form() {
        let values = [10.0, 11.0, 12.5, 11.0, 13.0];
        let got = ema(&values, 3).unwrap();

        let alpha = 2.0 / 4.0;
        let mut expected = vec![values[0]];
        for &v in &values[1..] {
            let prev = *expected.last().unwrap();
            expected.push(alpha * v + (1.0 - alpha) * prev);
        }

        for (g, e) in got.iter().zip(&expected) {
            assert!((g - e).abs() < EPS);
        }
    }

    #[test]
    fn test_macd_is_difference_of_emas() {
        let closes = wave(80);
        let series = series_from_closes("INFY.NS", &closes);
        let ind = calculate_technical_indicators(&series).unwrap();

        let fast = ema(&closes, MACD_FAST).unwrap();
        let slow = ema(&closes, MACD_SLOW).unwrap();
        for t in 0..closes.len() {
            assert!((ind.macd[t] - (fast[t] - slow[t])).abs() < EPS);
        }

        let signal = ema(&ind.macd, MACD_SIGNAL).unwrap();
        assert_eq!(ind.signal_line, signal);
        assert_eq!(ind.macd[0], 0.0);
    }

    #[test]
    fn test_bollinger_width_is_four_std() {
        let closes = wave(60);
        let series = series_from_closes("INFY.NS", &closes);
        let ind = calculate_technical_indicators(&series).unwrap();
        let std = rolling_sample_std(&closes, BOLLINGER_PERIOD).unwrap();

        for t in 0..closes.len() {
            match (ind.bb_upper[t], ind.bb_lower[t], std[t]) {
                (Some(u), Some(l), Some(s)) => assert!((u - l - 4.0 * s).abs() < 1e-8),
                (None, None, None) => assert!(t + 1 < BOLLINGER_PERIOD),
                other => panic!("misaligned bands at {t}: {other:?}"),
            }
        }
        assert_eq!(ind.bb_middle, ind.ma20);
    }

    #[test]
    fn test_sample_std_known_value() {
        let std = rolling_sample_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], 8).unwrap();
        // population std is 2.0; sample std is sqrt(32 / 7)
        assert!((std[7].unwrap() - (32.0f64 / 7.0).sqrt()).abs() < EPS);
    }

    #[test]
    fn test_short_series_leaves_long_windows_undefined() {
        let series = series_from_closes("TCS.NS", &wave(30));
        let ind = calculate_technical_indicators(&series).unwrap();
        assert!(ind.ma50.iter().all(Option::is_none));
        assert!(ind.ma200.iter().all(Option::is_none));
        assert!(ind.ma20[19].is_some());
        assert_eq!(ind.macd.len(), 30);
    }

    #[test]
    fn test_empty_series_is_invalid_input() {
        let series = PriceSeries::empty("TCS.NS");
        assert!(matches!(
            calculate_technical_indicators(&series),
            Err(DashboardError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_nan_close_is_invalid_input() {
        let series = series_from_closes("TCS.NS", &[1.0, f64::NAN, 3.0]);
        assert!(matches!(
            analyze(series),
            Err(DashboardError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_column_lookup() {
        let analyzed = analyze(series_from_closes("TCS.NS", &wave(25))).unwrap();
        assert_eq!(analyzed.column(Column::Close)[0], Some(wave(25)[0]));
        assert_eq!(analyzed.column(Column::Macd).len(), 25);
        assert_eq!(Column::SignalLine.name(), "Signal_Line");
    }

    #[test]
    fn test_interpret_rsi() {
        assert_eq!(interpret_rsi(75.0), "Overbought");
        assert_eq!(interpret_rsi(25.0), "Oversold");
        assert_eq!(interpret_rsi(50.0), "Neutral");
    }
}
