//! All-or-nothing folding of batch enqueue outcomes.

use rxfetch_core::{Download, EnqueueOutcome, FetchResult};
use tracing::warn;

/// Collapse per-request outcomes into one result.
///
/// The first refused request fails the whole batch.
pub(super) fn collect_batch(outcomes: Vec<EnqueueOutcome>) -> FetchResult<Vec<Download>> {
    outcomes
        .into_iter()
        .map(|EnqueueOutcome { request, result }| {
            result.inspect_err(|error| {
                warn!(url = %request.url, %error, "Batch enqueue rejected");
            })
        })
        .collect()
}
