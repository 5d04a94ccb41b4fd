use std::time::Duration;

const NANOS_PER_SEC: f64 = 1e9;

fn unit_nanos(unit: &str) -> Option<f64> {
    match unit {
        "ns" => Some(1.0),
        "us" | "µs" | "μs" => Some(1e3),
        "ms" => Some(1e6),
        "s" => Some(1e9),
        "m" => Some(60e9),
        "h" => Some(3600e9),
        _ => None,
    }
}

/// Parses Go-style durations: one or more `<number><unit>` pairs summed
/// together (`4m30s`, `1h5m`, `1.5m`, `100us`, `250ns`). Units are `ns`,
/// `us`/`µs`, `ms`, `s`, `m` and `h`. A bare number is seconds.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err("empty duration".to_string());
    }
    if value.starts_with('-') {
        return Err(format!("duration must be >= 0: {raw:?}"));
    }
    let value = value.strip_prefix('+').unwrap_or(value);
    let invalid = || format!("invalid duration {raw:?}");

    let total = match value.parse::<f64>() {
        Ok(secs) => secs * NANOS_PER_SEC,
        Err(_) => {
            let mut total = 0.0;
            let mut rest = value;
            while !rest.is_empty() {
                let number_end = rest
                    .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                    .unwrap_or(rest.len());
                let (number, tail) = rest.split_at(number_end);
                if number.is_empty() {
                    return Err(invalid());
                }
                let amount: f64 = number.parse().map_err(|_| invalid())?;

                let unit_end = tail
                    .find(|c: char| c.is_ascii_digit() || c == '.')
                    .unwrap_or(tail.len());
                let (unit, next) = tail.split_at(unit_end);
                let scale = unit_nanos(unit).ok_or_else(invalid)?;

                total += amount * scale;
                rest = next;
            }
            total
        }
    };

    if !total.is_finite() || total < 0.0 || total > u64::MAX as f64 {
        return Err(invalid());
    }
    Ok(Duration::from_nanos(total.round() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_units() {
        assert_eq!(parse_duration("1s").unwrap(), Duration::from_secs(1));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("1.5m").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration(" 3 ").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parses_sub_millisecond_units() {
        assert_eq!(parse_duration("100us").unwrap(), Duration::from_micros(100));
        assert_eq!(parse_duration("100µs").unwrap(), Duration::from_micros(100));
        assert_eq!(parse_duration("250ns").unwrap(), Duration::from_nanos(250));
    }

    #[test]
    fn sums_compound_durations() {
        assert_eq!(parse_duration("4m30s").unwrap(), Duration::from_secs(270));
        assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("1h5m").unwrap(), Duration::from_secs(3900));
        assert_eq!(parse_duration("1.5h").unwrap(), Duration::from_secs(5400));
        assert_eq!(
            parse_duration("2s300ms").unwrap(),
            Duration::from_millis(2300)
        );
        assert_eq!(parse_duration("+1s").unwrap(), Duration::from_secs(1));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("ms").is_err());
        assert!(parse_duration("-1s").is_err());
        assert!(parse_duration("five minutes").is_err());
        assert!(parse_duration("NaNs").is_err());
        assert!(parse_duration("4m30").is_err());
        assert!(parse_duration("3d").is_err());
        assert!(parse_duration("1m 30s").is_err());
    }
}
