//! Compact duration formatting
//!
//! Renders a count of seconds through the unit cascade
//! seconds → minutes → hours → days → weeks → years
//! (divisors 60, 60, 24, 7, 52), omitting zero-valued units,
//! most-significant unit first: `90061` → `"1d 1h 1m 1s"`.

use std::time::Duration;

const UNITS: [(char, u64); 6] = [('s', 1), ('m', 60), ('h', 60), ('d', 24), ('w', 7), ('y', 52)];

/// Format whole seconds as a compact human string.
///
/// Zero seconds render as an empty string.
pub fn duration_from_secs(total_seconds: u64) -> String {
    let mut carry = total_seconds;
    let mut parts: Vec<(char, u64)> = Vec::new();

    for (symbol, divisor) in UNITS {
        let remainder = carry % divisor;
        carry /= divisor;
        if carry == 0 {
            break;
        }
        if let Some(last) = parts.last_mut() {
            last.1 = remainder;
        }
        parts.push((symbol, carry));
    }

    let rendered: Vec<String> = parts
        .iter()
        .rev()
        .filter(|(_, count)| *count != 0)
        .map(|(symbol, count)| format!("{count}{symbol}"))
        .collect();

    rendered.join(" ")
}

/// [`Duration`] convenience wrapper over whole seconds
pub fn format_duration(duration: Duration) -> String {
    duration_from_secs(duration.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_renders_empty() {
        assert_eq!(duration_from_secs(0), "");
    }

    #[test]
    fn seconds_only() {
        assert_eq!(duration_from_secs(59), "59s");
    }

    #[test]
    fn exact_units_omit_the_rest() {
        assert_eq!(duration_from_secs(60), "1m");
        assert_eq!(duration_from_secs(3600), "1h");
        assert_eq!(duration_from_secs(86400), "1d");
        assert_eq!(duration_from_secs(604_800), "1w");
        assert_eq!(duration_from_secs(52 * 604_800), "1y");
    }

    #[test]
    fn mixed_units_render_most_significant_first() {
        assert_eq!(duration_from_secs(90_061), "1d 1h 1m 1s");
        assert_eq!(duration_from_secs(61), "1m 1s");
    }

    #[test]
    fn zero_valued_middle_units_are_omitted() {
        // 1h 0m 1s
        assert_eq!(duration_from_secs(3601), "1h 1s");
    }

    #[test]
    fn duration_wrapper_truncates_to_whole_seconds() {
        assert_eq!(format_duration(Duration::from_millis(61_500)), "1m 1s");
    }
}
