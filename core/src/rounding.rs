//! Rounding from millisecond totals into the published units. Spec
//! leaves the rounding mode unspecified and recommends round-half-to-
//! even, which is what this module implements, using integer
//! arithmetic throughout so no floating-point representation error
//! can creep into a published figure.

/// `numerator / denominator`, rounded to the nearest integer, ties
/// rounding to even. Both operands are expected non-negative (they
/// are always millisecond totals here).
fn round_half_to_even_div(numerator: i64, denominator: i64) -> i64 {
    debug_assert!(denominator > 0);
    debug_assert!(numerator >= 0);
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    let twice_remainder = remainder * 2;
    match twice_remainder.cmp(&denominator) {
        std::cmp::Ordering::Less => quotient,
        std::cmp::Ordering::Greater => quotient + 1,
        std::cmp::Ordering::Equal => {
            if quotient % 2 == 0 {
                quotient
            } else {
                quotient + 1
            }
        }
    }
}

/// Milliseconds to whole minutes, for the last-hour window.
pub fn ms_to_minutes(ms: i64) -> i64 {
    round_half_to_even_div(ms, 60_000)
}

/// Milliseconds to hours with two fractional digits, for the
/// last-day/last-week windows, formatted as `"12.34"`.
pub fn ms_to_hours_2dp(ms: i64) -> String {
    let hundredths = round_half_to_even_div(ms * 100, 3_600_000);
    format!("{}.{:02}", hundredths / 100, hundredths % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minutes_rounds_ties_to_even() {
        assert_eq!(ms_to_minutes(90_000), 2); // 1.5 min -> 2 (even)
        assert_eq!(ms_to_minutes(30_000), 0); // 0.5 min -> 0 (even)
        assert_eq!(ms_to_minutes(150_000), 2); // 2.5 min -> 2 (even)
    }

    #[test]
    fn minutes_rounds_plain_cases() {
        assert_eq!(ms_to_minutes(0), 0);
        assert_eq!(ms_to_minutes(44_000), 1);
        assert_eq!(ms_to_minutes(3_600_000), 60);
    }

    #[test]
    fn hours_two_decimal_places() {
        assert_eq!(ms_to_hours_2dp(0), "0.00");
        assert_eq!(ms_to_hours_2dp(3_600_000), "1.00");
        assert_eq!(ms_to_hours_2dp(5_400_000), "1.50");
        assert_eq!(ms_to_hours_2dp(168 * 3_600_000), "168.00");
    }

    #[test]
    fn hours_rounds_ties_to_even_hundredth() {
        // 0.005h tie: hundredths candidate 0 vs 1, 0 is even -> 0.00
        let ms_for_half_hundredth = 3_600_000 / 200; // exactly 0.005 hours
        assert_eq!(ms_to_hours_2dp(ms_for_half_hundredth), "0.00");
    }
}
