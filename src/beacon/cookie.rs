//! Visitor cookie (`utmcc`) construction.
//!
//! The cookie is two top-level segments joined by an escaped `+`: a visit
//! counter (`__utma`) and a campaign segment (`__utmz`). The two segments use
//! different escaping rules: `__utma` is escaped as one `key=value` unit,
//! while `__utmz` escapes only the `key=` prefix and appends a value that
//! already carries its own internal escaping.

use crate::config::ConfigError;
use crate::encoding::{join_with_encoded_delimiter, percent_encode};
use crate::random::RandomSource;

/// Visit-counter random id range, [1e9, i32::MAX].
const VISITOR_RANDOM_RANGE: std::ops::RangeInclusive<u64> = 1_000_000_000..=0x7fff_ffff;

/// Campaign attribution attached to a visitor cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Campaign {
    pub name: String,
    pub source: String,
}

impl Campaign {
    /// Build a campaign, substituting the literal `(direct)` for an empty
    /// name or source.
    pub fn new(name: &str, source: &str) -> Self {
        Self {
            name: if name.is_empty() {
                "(direct)".to_string()
            } else {
                name.to_string()
            },
            source: if source.is_empty() {
                "(direct)".to_string()
            } else {
                source.to_string()
            },
        }
    }
}

impl Default for Campaign {
    fn default() -> Self {
        Self::new("", "")
    }
}

/// Build the composite `utmcc` cookie value.
///
/// `now_unix` and `random` are injected so construction is deterministic
/// under test. Fails when `seed` is empty; the collector cannot bucket a
/// visitor without it.
pub fn build_utm_cookie(
    seed: &str,
    campaign: &Campaign,
    now_unix: i64,
    random: &dyn RandomSource,
) -> Result<String, ConfigError> {
    if seed.is_empty() {
        return Err(ConfigError::MissingCookieSeed);
    }

    let random_id = random.next_in_range(VISITOR_RANDOM_RANGE);

    // utmccn/utmcsr/utmcmd in this order; `key=` escaped, value appended raw.
    let campaign_fields = [
        ("utmccn", campaign.name.as_str()),
        ("utmcsr", campaign.source.as_str()),
        ("utmcmd", "(none)"),
    ];
    let fragments: Vec<String> = campaign_fields
        .iter()
        .map(|(key, value)| format!("{}{}", percent_encode(&format!("{key}=")), value))
        .collect();
    let campaign_segment = join_with_encoded_delimiter(&fragments, "|");

    // First, previous and current visit timestamps are all the construction
    // instant; the collector parses exactly this shape.
    let utma = format!("{seed}.{random_id}.{now_unix}.{now_unix}.{now_unix}.2;");
    let utmz = format!(
        "{}{seed}.{now_unix}.1.2.{campaign_segment}{}",
        percent_encode("__utmz="),
        percent_encode(";")
    );

    let entries = [
        percent_encode(&format!("__utma={utma}")).into_owned(),
        utmz,
    ];
    Ok(join_with_encoded_delimiter(&entries, "+"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::FixedRandom;

    #[test]
    fn empty_seed_is_rejected() {
        let err = build_utm_cookie("", &Campaign::default(), 1_700_000_000, &FixedRandom(1))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingCookieSeed));
    }

    #[test]
    fn visit_counter_repeats_the_timestamp_three_times() {
        let cookie = build_utm_cookie(
            "117243",
            &Campaign::new("spring", "newsletter"),
            1234567890,
            &FixedRandom(555000111),
        )
        .unwrap();
        let utma = cookie.split("%2B").next().unwrap();
        assert_eq!(
            utma,
            percent_encode("__utma=117243.555000111.1234567890.1234567890.1234567890.2;").as_ref()
        );
    }

    #[test]
    fn splits_into_utma_and_utmz_segments() {
        let cookie = build_utm_cookie(
            "117243",
            &Campaign::default(),
            1_700_000_000,
            &FixedRandom(2_000_000_000),
        )
        .unwrap();
        let segments: Vec<&str> = cookie.split("%2B").collect();
        assert_eq!(segments.len(), 2);
        assert!(segments[0].starts_with("__utma%3D"));
        assert!(segments[1].starts_with("__utmz%3D"));
    }

    #[test]
    fn campaign_segment_keeps_values_raw() {
        let cookie = build_utm_cookie(
            "42",
            &Campaign::new("spring", "newsletter"),
            100,
            &FixedRandom(1_000_000_000),
        )
        .unwrap();
        assert!(cookie.contains("utmccn%3Dspring%7Cutmcsr%3Dnewsletter%7Cutmcmd%3D(none)"));
    }

    #[test]
    fn empty_campaign_inputs_fall_back_to_direct() {
        assert_eq!(Campaign::new("", ""), Campaign::new("(direct)", "(direct)"));
    }

    #[test]
    fn utmz_value_is_appended_raw_after_escaped_key() {
        let cookie = build_utm_cookie("9", &Campaign::default(), 7, &FixedRandom(1_000_000_000))
            .unwrap();
        let utmz = cookie.split("%2B").nth(1).unwrap();
        assert!(utmz.starts_with("__utmz%3D9.7.1.2.utmccn%3D(direct)%7C"));
        assert!(utmz.ends_with("%3B"));
    }
}
