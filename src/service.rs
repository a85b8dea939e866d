//! Validated descriptions of the remote authentication service.

pub mod descriptor;

pub use descriptor::*;
