//! Access-token models: signed-credential claims, records, and secret wrappers.

pub mod claims;
pub mod record;
pub mod secret;
