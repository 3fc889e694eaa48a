//! Shared User-Agent string for relay HTTP traffic.
//!
//! Download and upload requests go through the same client, so a single
//! format identifies both legs of a transfer.

/// Product token used in the User-Agent header.
const PRODUCT_NAME: &str = "stream-relay";

/// Default User-Agent for relay requests (identifies the tool and version).
#[must_use]
pub(crate) fn default_relay_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("{PRODUCT_NAME}/{version}")
}
