//! Assembly of the legacy collector's beacon URL and visitor cookie.
//!
//! The collector's wire format is position- and escape-sensitive: parameters
//! appear in a fixed order, most values are escaped in place, and the cookie
//! and event payload arrive pre-escaped. The builders here own those rules
//! and are pure given their injected collaborators.

pub mod cookie;
pub mod event;
pub mod url;

pub use cookie::{build_utm_cookie, Campaign};
pub use event::format_event_payload;
pub use url::{build_beacon_url, BeaconParams, CollectorEndpoints};
