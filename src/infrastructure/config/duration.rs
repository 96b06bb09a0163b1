//! Human-friendly durations used by timeouts and poll intervals.
//!
//! Accepted forms are `<n>s`, `<n>m`, `<n>h` and a bare number of seconds.

use std::time::Duration;

use serde::{Deserialize, Deserializer};

/// Parse a duration such as `30m`, `2h`, `45s` or `120`.
///
/// # Errors
///
/// Returns a description of the problem when the text is not one of the
/// accepted forms.
pub fn parse_duration(text: &str) -> Result<Duration, String> {
    let text = text.trim();
    let (digits, multiplier) = match text.char_indices().last() {
        Some((idx, 's')) => (&text[..idx], 1),
        Some((idx, 'm')) => (&text[..idx], 60),
        Some((idx, 'h')) => (&text[..idx], 3600),
        Some(_) => (text, 1),
        None => return Err("empty duration".to_string()),
    };
    let value: u64 = digits
        .trim()
        .parse()
        .map_err(|_| format!("invalid duration '{text}', expected e.g. 45s, 30m, 2h"))?;
    value
        .checked_mul(multiplier)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{text}' is too large"))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Seconds(u64),
    Text(String),
}

/// Serde adapter for `#[serde(deserialize_with = "...")]`.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    match RawDuration::deserialize(deserializer)? {
        RawDuration::Seconds(secs) => Ok(Duration::from_secs(secs)),
        RawDuration::Text(text) => parse_duration(&text).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_suffixed_and_bare_values() {
        assert_eq!(parse_duration("30m"), Ok(Duration::from_secs(1800)));
        assert_eq!(parse_duration("2h"), Ok(Duration::from_secs(7200)));
        assert_eq!(parse_duration("45s"), Ok(Duration::from_secs(45)));
        assert_eq!(parse_duration(" 120 "), Ok(Duration::from_secs(120)));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("5d").is_err());
        assert!(parse_duration("m").is_err());
    }
}
