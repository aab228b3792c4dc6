//! Shared User-Agent string for fetch HTTP clients.
//!
//! Single source for the project URL and UA format so download and verify
//! traffic stay consistent and easy to update (good citizenship; RFC 9308).

/// Project URL for User-Agent identification (good citizenship; RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/parfetch/parfetch";

/// Default User-Agent for all outbound requests (identifies the tool).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("parfetch/{version} (+{PROJECT_UA_URL})")
}
