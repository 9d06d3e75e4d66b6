use crate::error::DomainError;

/// Characters per standard word
const CHARS_PER_WORD: f64 = 5.0;

/// Words per minute from a character count and elapsed wall-clock seconds.
///
/// Zero (or negative, or NaN) elapsed time has no rate and yields 0.
pub fn words_per_minute(char_count: usize, elapsed_seconds: f64) -> f64 {
    if elapsed_seconds.is_nan() || elapsed_seconds <= 0.0 {
        return 0.0;
    }

    let words = char_count as f64 / CHARS_PER_WORD;
    let minutes = elapsed_seconds / 60.0;
    words / minutes
}

/// Elapsed seconds implied by typing `char_count` chars at `wpm`.
///
/// Inverse of [`words_per_minute`]; a zero, negative or NaN rate yields 0.
pub fn elapsed_seconds_at(char_count: usize, wpm: f64) -> f64 {
    if wpm.is_nan() || wpm <= 0.0 {
        return 0.0;
    }

    char_count as f64 / CHARS_PER_WORD / wpm * 60.0
}

/// Percentage of positions where `typed` matches `target`, over the target length.
///
/// Only the overlapping prefix is compared.
pub fn accuracy_percent(target: &str, typed: &str) -> Result<f64, DomainError> {
    let target_len = target.chars().count();
    if target_len == 0 {
        return Err(DomainError::EmptyTarget);
    }

    let correct = target
        .chars()
        .zip(typed.chars())
        .filter(|(expected, actual)| expected == actual)
        .count();

    Ok(correct as f64 / target_len as f64 * 100.0)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    match values.len() {
        0 => None,
        count => Some(values.iter().sum::<f64>() / count as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wpm_standard_rate() {
        // 50 chars in 60 seconds = 10 words per minute
        assert_eq!(words_per_minute(50, 60.0), 10.0);
    }

    #[test]
    fn test_wpm_zero_elapsed() {
        assert_eq!(words_per_minute(42, 0.0), 0.0);
    }

    #[test]
    fn test_wpm_negative_elapsed() {
        for elapsed in [-0.001, -1.0, -3600.0, f64::NEG_INFINITY] {
            assert_eq!(words_per_minute(10, elapsed), 0.0);
        }
    }

    #[test]
    fn test_wpm_nan_elapsed() {
        assert_eq!(words_per_minute(10, f64::NAN), 0.0);
    }

    #[test]
    fn test_wpm_three_chars() {
        let wpm = words_per_minute(3, 0.60);
        assert!((wpm - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_elapsed_inverts_wpm() {
        assert!((elapsed_seconds_at(3, 60.0) - 0.6).abs() < 1e-9);
        let wpm = words_per_minute(44, 9.25);
        assert!((elapsed_seconds_at(44, wpm) - 9.25).abs() < 1e-9);
    }

    #[test]
    fn test_elapsed_zero_rate() {
        for wpm in [0.0, -1.0, f64::NAN] {
            assert_eq!(elapsed_seconds_at(10, wpm), 0.0);
        }
    }

    #[test]
    fn test_accuracy_all_match() {
        assert_eq!(accuracy_percent("hello", "hello").unwrap(), 100.0);
    }

    #[test]
    fn test_accuracy_none_match() {
        assert_eq!(accuracy_percent("abc", "xyz").unwrap(), 0.0);
    }

    #[test]
    fn test_accuracy_partial() {
        assert_eq!(accuracy_percent("test", "txst").unwrap(), 75.0);
    }

    #[test]
    fn test_accuracy_short_typed_uses_overlap() {
        // Missing trailing positions count as misses against the target length
        assert_eq!(accuracy_percent("abcd", "ab").unwrap(), 50.0);
    }

    #[test]
    fn test_accuracy_long_typed_ignores_excess() {
        assert_eq!(accuracy_percent("ab", "abzzz").unwrap(), 100.0);
    }

    #[test]
    fn test_accuracy_counts_chars_not_bytes() {
        assert_eq!(accuracy_percent("café", "cafe").unwrap(), 75.0);
    }

    #[test]
    fn test_accuracy_empty_target() {
        assert_eq!(accuracy_percent("", "abc"), Err(DomainError::EmptyTarget));
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[10., 20., 30., 15., 22.]), Some(19.4));
        assert_eq!(mean(&[42.0]), Some(42.0));
    }

    #[test]
    fn test_mean_empty_slice() {
        assert_eq!(mean(&[]), None);
    }
}
