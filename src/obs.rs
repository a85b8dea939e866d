//! Optional observability helpers for pipeline operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `auth_pipeline.op` with
//!   the `op` (operation) and `stage` (call site) fields.
//! - Enable `metrics` to increment the `auth_pipeline_op_total` counter for
//!   every attempt/success/failure, labeled by `op` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Pipeline operations observed by spans and counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// Credentialed login attempt.
	Login,
	/// Account registration attempt.
	Register,
	/// Logout (server notify plus local clear).
	Logout,
	/// Local login-state read.
	Status,
	/// Single-flight token refresh.
	Refresh,
	/// Authenticated pass-through request.
	Request,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::Login => "login",
			OpKind::Register => "register",
			OpKind::Logout => "logout",
			OpKind::Status => "status",
			OpKind::Refresh => "refresh",
			OpKind::Request => "request",
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to a pipeline operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
