use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use super::error::EngineError;
use super::repository::{ApplicationRepository, MatchRepository, ProfileDirectory};
use super::service::{MatchingService, PostingFailure, RecomputeSummary};

/// Recompute every posting, running up to `concurrency` postings at once.
///
/// Allocation within a posting stays serialized by the service's posting lock.
/// A posting that fails or panics is reported in `failures` without stopping the rest.
pub async fn recompute_all_parallel<D, M, A>(
    service: Arc<MatchingService<D, M, A>>,
    concurrency: usize,
) -> Result<RecomputeSummary, EngineError>
where
    D: ProfileDirectory + 'static,
    M: MatchRepository + 'static,
    A: ApplicationRepository + 'static,
{
    let postings = service.posting_ids()?;
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for internship_id in postings {
        let permit = match Arc::clone(&permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };
        let service = Arc::clone(&service);
        tasks.spawn_blocking(move || {
            let _permit = permit;
            (internship_id, service.recompute_for_posting(internship_id))
        });
    }

    let mut summary = RecomputeSummary::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((_, Ok(posting_summary))) => summary.absorb(posting_summary),
            Ok((internship_id, Err(err))) => {
                warn!(internship = internship_id.0, error = %err, "posting recompute failed");
                summary.failures.push(PostingFailure {
                    internship_id: Some(internship_id),
                    error: err.to_string(),
                });
            }
            Err(join_error) => {
                warn!(error = %join_error, "posting recompute task aborted");
                summary.failures.push(PostingFailure {
                    internship_id: None,
                    error: join_error.to_string(),
                });
            }
        }
    }

    info!(
        postings = summary.postings,
        created = summary.created,
        updated = summary.updated,
        expired = summary.expired,
        failures = summary.failures.len(),
        concurrency,
        "parallel recompute finished"
    );
    Ok(summary)
}
