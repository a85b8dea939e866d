//! Auth-domain identifiers, session models, and token types.

pub mod identity;
pub mod session;
pub mod token;

pub use identity::*;
pub use session::*;
pub use token::{claims::*, record::*, secret::*};
