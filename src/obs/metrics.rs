// self
use crate::obs::{InteractionKind, StageOutcome};

/// Records a protocol stage outcome via the global metrics recorder (when enabled).
pub fn record_stage_outcome(kind: InteractionKind, outcome: StageOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_token_cache_stage_total",
			"interaction" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records the request-initialization duration via the global metrics recorder.
pub(crate) fn record_init_duration(kind: InteractionKind, elapsed: std::time::Duration) {
	#[cfg(feature = "metrics")]
	{
		metrics::histogram!(
			"oauth2_token_cache_request_init_seconds",
			"interaction" => kind.as_str()
		)
		.record(elapsed.as_secs_f64());
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, elapsed);
	}
}
