//! Beacon URL assembly.

use crate::encoding::percent_encode;
use crate::random::RandomSource;

/// Protocol version reported in every beacon.
const PROTOCOL_VERSION: &str = "4.4sh";

/// Dedupe id range for the `utmn` cache-buster.
const DEDUPE_RANGE: std::ops::RangeInclusive<u64> = 1_000_000_000..=9_999_999_999;

/// Collector gif endpoints, one per scheme.
#[derive(Debug, Clone)]
pub struct CollectorEndpoints {
    pub plain: String,
    pub secure: String,
}

impl Default for CollectorEndpoints {
    fn default() -> Self {
        Self {
            plain: "http://www.google-analytics.com/__utm.gif".to_string(),
            secure: "https://www.google-analytics.com/__utm.gif".to_string(),
        }
    }
}

/// One beacon's worth of parameter values, borrowed from tracker state.
#[derive(Debug, Clone, Copy)]
pub struct BeaconParams<'a> {
    pub server_name: &'a str,
    pub referer: &'a str,
    pub page_path: &'a str,
    pub page_title: &'a str,
    /// Pre-escaped event payload; `Some` switches the beacon to event mode.
    pub event_payload: Option<&'a str>,
    pub account_id: &'a str,
    pub client_address: &'a str,
    /// Pre-escaped cookie value, empty when no campaign has been set.
    pub cookie: &'a str,
}

/// Assemble the full beacon URL.
///
/// Parameter order is a wire contract: `utmwv`, `utmn`, `utmhn`, `utmr`,
/// `utmp`, `utmdt`, then in event mode `utme` and `utmt=event`, then `utmac`,
/// `utmip`, `utmcc`. Names are always escaped; values are escaped except for
/// `utme` and `utmcc`, which arrive pre-escaped and must not be escaped
/// twice.
pub fn build_beacon_url(
    endpoints: &CollectorEndpoints,
    params: &BeaconParams<'_>,
    secure: bool,
    random: &dyn RandomSource,
) -> String {
    let dedupe = random.next_in_range(DEDUPE_RANGE).to_string();

    // (name, value, pre-escaped)
    let mut pairs: Vec<(&str, &str, bool)> = vec![
        ("utmwv", PROTOCOL_VERSION, false),
        ("utmn", dedupe.as_str(), false),
        ("utmhn", params.server_name, false),
        ("utmr", params.referer, false),
        ("utmp", params.page_path, false),
        ("utmdt", params.page_title, false),
    ];
    if let Some(payload) = params.event_payload {
        pairs.push(("utme", payload, true));
        pairs.push(("utmt", "event", false));
    }
    pairs.push(("utmac", params.account_id, false));
    pairs.push(("utmip", params.client_address, false));
    pairs.push(("utmcc", params.cookie, true));

    let query: Vec<String> = pairs
        .iter()
        .map(|(name, value, pre_escaped)| {
            let name = percent_encode(name);
            if *pre_escaped {
                format!("{name}={value}")
            } else {
                format!("{name}={}", percent_encode(value))
            }
        })
        .collect();

    let endpoint = if secure {
        &endpoints.secure
    } else {
        &endpoints.plain
    };
    format!("{}?{}", endpoint, query.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::FixedRandom;

    fn params(event: Option<&str>) -> BeaconParams<'_> {
        BeaconParams {
            server_name: "www.example.com",
            referer: "-",
            page_path: "/landing",
            page_title: "(not set)",
            event_payload: event,
            account_id: "UA-1-1",
            client_address: "203.0.113.9",
            cookie: "__utma%3D1.2.3.3.3.2%3B",
        }
    }

    fn query_names(url: &str) -> Vec<&str> {
        url.split_once('?')
            .unwrap()
            .1
            .split('&')
            .map(|pair| pair.split_once('=').unwrap().0)
            .collect()
    }

    #[test]
    fn page_view_omits_event_parameters() {
        let url = build_beacon_url(
            &CollectorEndpoints::default(),
            &params(None),
            false,
            &FixedRandom(1_234_567_890),
        );
        assert!(!url.contains("utme="));
        assert!(!url.contains("utmt="));
    }

    #[test]
    fn event_mode_inserts_payload_and_tag_between_title_and_account() {
        let url = build_beacon_url(
            &CollectorEndpoints::default(),
            &params(Some("5(cat*act)")),
            false,
            &FixedRandom(1_234_567_890),
        );
        assert_eq!(
            query_names(&url),
            [
                "utmwv", "utmn", "utmhn", "utmr", "utmp", "utmdt", "utme", "utmt", "utmac",
                "utmip", "utmcc"
            ]
        );
    }

    #[test]
    fn utmac_utmip_utmcc_adjacency_holds_in_both_modes() {
        for event in [None, Some("5(cat*act)")] {
            let url = build_beacon_url(
                &CollectorEndpoints::default(),
                &params(event),
                false,
                &FixedRandom(1_234_567_890),
            );
            let names = query_names(&url);
            let at = names.iter().position(|name| *name == "utmac").unwrap();
            assert_eq!(names[at + 1], "utmip");
            assert_eq!(names[at + 2], "utmcc");
        }
    }

    #[test]
    fn values_are_escaped_except_cookie_and_event_payload() {
        let url = build_beacon_url(
            &CollectorEndpoints::default(),
            &params(Some("5(a%20b*act)")),
            false,
            &FixedRandom(1_234_567_890),
        );
        assert!(url.contains("utmp=%2Flanding"));
        assert!(url.contains("utmdt=%28not%20set%29"));
        assert!(url.contains("utme=5(a%20b*act)"));
        assert!(url.contains("utmcc=__utma%3D1.2.3.3.3.2%3B"));
    }

    #[test]
    fn scheme_flag_selects_the_endpoint() {
        let endpoints = CollectorEndpoints {
            plain: "http://collector.local/__utm.gif".to_string(),
            secure: "https://collector.local/__utm.gif".to_string(),
        };
        let plain = build_beacon_url(&endpoints, &params(None), false, &FixedRandom(1));
        let secure = build_beacon_url(&endpoints, &params(None), true, &FixedRandom(1));
        assert!(plain.starts_with("http://collector.local/__utm.gif?"));
        assert!(secure.starts_with("https://collector.local/__utm.gif?"));
    }

    #[test]
    fn dedupe_number_comes_from_the_injected_source() {
        let url = build_beacon_url(
            &CollectorEndpoints::default(),
            &params(None),
            false,
            &FixedRandom(4_242_424_242),
        );
        assert!(url.contains("utmn=4242424242"));
    }
}
