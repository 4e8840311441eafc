//! Budget and quote amounts.

use serde::Serialize;

use crate::JobsError;

/// Share of a job's budget paid to the worker. The rest is the platform fee.
pub const WORKER_SHARE: f64 = 0.70;

/// How a budget divides between worker and platform, fixed at posting time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Split {
    pub worker_earnings: f64,
    pub platform_fee: f64,
}

/// Split `budget`, each side rounded to cents on its own.
#[must_use]
pub fn split(budget: f64) -> Split {
    Split {
        worker_earnings: round_cents(budget * WORKER_SHARE),
        platform_fee: round_cents(budget * (1.0 - WORKER_SHARE)),
    }
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// What an entered amount is for; picks the rejection message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountKind {
    Budget,
    Quote,
}

impl AmountKind {
    const fn invalid_message(self) -> &'static str {
        match self {
            Self::Budget => "Please enter a valid budget amount greater than 0.",
            Self::Quote => "Please enter a valid quote amount greater than 0.",
        }
    }
}

/// Parse a dollar amount typed by the viewer.
///
/// # Errors
///
/// `JobsError::Validation` unless `raw` is a finite number above zero.
pub fn parse_amount(raw: &str, kind: AmountKind) -> Result<f64, JobsError> {
    match raw.trim().trim_start_matches('$').parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount > 0.0 => Ok(amount),
        _ => Err(JobsError::Validation(kind.invalid_message().into())),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(100.0, 70.0, 30.0)]
    #[case(45.5, 31.85, 13.65)]
    #[case(0.01, 0.01, 0.0)]
    #[case(33.33, 23.33, 10.0)]
    fn split_rounds_each_side(#[case] budget: f64, #[case] worker: f64, #[case] fee: f64) {
        let split = split(budget);
        assert!((split.worker_earnings - worker).abs() < 1e-9, "{split:?}");
        assert!((split.platform_fee - fee).abs() < 1e-9, "{split:?}");
    }

    #[rstest]
    #[case("80", 80.0)]
    #[case(" 12.50 ", 12.5)]
    #[case("$40", 40.0)]
    fn accepts_positive_amounts(#[case] raw: &str, #[case] expected: f64) {
        assert!((parse_amount(raw, AmountKind::Quote).unwrap() - expected).abs() < 1e-9);
    }

    #[rstest]
    #[case("")]
    #[case("0")]
    #[case("-5")]
    #[case("abc")]
    #[case("NaN")]
    #[case("inf")]
    fn rejects_everything_else(#[case] raw: &str) {
        let err = parse_amount(raw, AmountKind::Budget).unwrap_err();
        assert_eq!(err.to_string(), "Please enter a valid budget amount greater than 0.");
    }
}
