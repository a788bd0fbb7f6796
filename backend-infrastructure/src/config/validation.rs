use anyhow::{anyhow, Result};
use chrono_tz::Tz;

pub fn parse_timezone(value: &str) -> Result<Tz> {
    value
        .trim()
        .parse::<Tz>()
        .map_err(|err| anyhow!("invalid timezone '{}': {}", value, err))
}

/// A period is the festival year, e.g. `2025`.
pub fn validate_period(value: &str) -> Result<()> {
    let trimmed = value.trim();
    if trimmed.len() != 4 || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(anyhow!("period must be a four digit year, got '{}'", value));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_timezone_parses() {
        let tz = parse_timezone("Asia/Jerusalem").expect("timezone");
        assert_eq!(tz, chrono_tz::Asia::Jerusalem);
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        assert!(parse_timezone("Mars/Olympus").is_err());
    }

    #[test]
    fn period_must_be_a_year() {
        assert!(validate_period("2025").is_ok());
        assert!(validate_period("25").is_err());
        assert!(validate_period("20x5").is_err());
    }
}
