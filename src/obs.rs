//! Observability helpers for interaction flows.
//!
//! # Feature Flags
//!
//! - Structured `tracing` events are always emitted; the
//!   `oauth2_token_cache.request_init` event carries the flow kind, the request's
//!   correlation id, and the elapsed initialization time.
//! - Enable `metrics` to additionally increment the `oauth2_token_cache_stage_total`
//!   counter for every attempt/success/failure, labeled by `interaction` + `outcome`.

mod metrics;

pub use metrics::*;

// self
use crate::_prelude::*;

/// Interaction flow kinds observed by the protocol layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InteractionKind {
	/// Full-page redirect flow.
	Redirect,
	/// Popup window flow.
	Popup,
	/// Hidden-frame silent refresh flow.
	Silent,
	/// Silent authorization-code exchange flow.
	SilentCode,
}
impl InteractionKind {
	/// Returns a stable label suitable for event or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			InteractionKind::Redirect => "redirect",
			InteractionKind::Popup => "popup",
			InteractionKind::Silent => "silent",
			InteractionKind::SilentCode => "silent_code",
		}
	}
}
impl Display for InteractionKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each protocol stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageOutcome {
	/// Entry to a protocol operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl StageOutcome {
	/// Returns a stable label suitable for event or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			StageOutcome::Attempt => "attempt",
			StageOutcome::Success => "success",
			StageOutcome::Failure => "failure",
		}
	}
}
impl Display for StageOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Emits the performance-measurement event for a completed request initialization,
/// tagged with the request's correlation id.
pub fn record_request_init(
	kind: InteractionKind,
	correlation_id: &str,
	elapsed: std::time::Duration,
) {
	tracing::debug!(
		target: "oauth2_token_cache.request_init",
		interaction = kind.as_str(),
		correlation_id,
		elapsed_us = elapsed.as_micros() as u64,
		"Request initialization completed.",
	);
	record_init_duration(kind, elapsed);
}
