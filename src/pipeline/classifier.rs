//! Exclusion classifier
//!
//! One-shot decision taken when a record is created. A signal is excluded
//! from aggregate statistics when the token had already retraced more than
//! half from its ATH at detection time (or when no ATH is known). The result
//! is stored with the record and never re-evaluated.

/// Minimum baseline / ATH-at-detection ratio for a signal to be included
pub const MIN_ATH_RATIO: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    /// baseline market cap ÷ ATH-at-detection, when computable
    pub ath_ratio: Option<f64>,
    pub is_excluded: bool,
}

/// Classify a signal from its baseline market cap and ATH-at-detection
pub fn classify(baseline_mc_usd: Option<f64>, ath_at_detection: Option<f64>) -> Classification {
    let ath = match ath_at_detection {
        Some(ath) if ath > 0.0 => ath,
        _ => {
            return Classification {
                ath_ratio: None,
                is_excluded: true,
            }
        }
    };

    let ratio = baseline_mc_usd.unwrap_or(0.0) / ath;

    Classification {
        ath_ratio: Some(ratio),
        is_excluded: !(ratio >= MIN_ATH_RATIO),
    }
}
