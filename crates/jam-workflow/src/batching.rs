//! Splitting id sets into bounded batches and dispatching them.
//!
//! Chunks keep the caller's id order: concatenating them in chunk order
//! reproduces the input exactly. Once any chunk fails, no further chunk is
//! issued; chunks already in flight are awaited so their outcome is known.

use std::future::Future;

use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, trace, warn};

use jam_core::{BatchOutcome, CompanyId, Error, Result, TransportError, TransportResult};

/// Split `ids` into contiguous chunks of at most `batch_size`, in order.
///
/// A set no larger than `batch_size` yields exactly one chunk.
pub fn partition(ids: &[CompanyId], batch_size: usize) -> Result<Vec<Vec<CompanyId>>> {
    if batch_size == 0 {
        return Err(Error::InvalidInput("batch size must be positive".to_string()));
    }
    Ok(ids.chunks(batch_size).map(<[CompanyId]>::to_vec).collect())
}

/// How chunks of one move are dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchStrategy {
    /// One chunk at a time; chunk k+1 is sent only after chunk k resolves.
    #[default]
    Sequential,
    /// Up to `max_in_flight` chunks outstanding at once.
    Bounded { max_in_flight: usize },
}

impl BatchStrategy {
    pub fn from_max_in_flight(max_in_flight: usize) -> Self {
        if max_in_flight == 1 {
            Self::Sequential
        } else {
            Self::Bounded { max_in_flight }
        }
    }

    pub fn max_in_flight(&self) -> usize {
        match self {
            Self::Sequential => 1,
            Self::Bounded { max_in_flight } => *max_in_flight,
        }
    }
}

/// Per-chunk results of one dispatch, in chunk order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub outcomes: Vec<BatchOutcome>,
}

impl DispatchReport {
    /// Ids of every chunk the store accepted.
    pub fn moved_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.is_moved())
            .map(|o| o.company_ids().len())
            .sum()
    }

    /// Ids from failed and unissued chunks, in selection order.
    pub fn not_moved(&self) -> Vec<CompanyId> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_moved())
            .flat_map(|o| o.company_ids().iter().copied())
            .collect()
    }

    /// Failure of the lowest-indexed chunk that failed.
    pub fn first_failure(&self) -> Option<&TransportError> {
        self.outcomes.iter().find_map(|o| match o {
            BatchOutcome::Failed { error, .. } => Some(error),
            _ => None,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(BatchOutcome::is_moved)
    }
}

/// Issue `chunks` through `send` under `strategy`.
///
/// `on_issue(index, total)` runs just before each chunk is sent. Failures are
/// tagged with their chunk index.
pub async fn dispatch<F, Fut>(
    chunks: Vec<Vec<CompanyId>>,
    strategy: BatchStrategy,
    mut on_issue: impl FnMut(usize, usize),
    send: F,
) -> DispatchReport
where
    F: Fn(usize, Vec<CompanyId>) -> Fut,
    Fut: Future<Output = TransportResult<usize>>,
{
    let total = chunks.len();
    let max_in_flight = strategy.max_in_flight().max(1);
    let mut slots: Vec<Option<BatchOutcome>> = vec![None; total];
    let mut pending = chunks.into_iter().enumerate();
    let mut in_flight = FuturesUnordered::new();
    let mut failed = false;

    loop {
        while !failed && in_flight.len() < max_in_flight {
            let Some((index, ids)) = pending.next() else {
                break;
            };
            on_issue(index, total);
            trace!(batch_index = index, ids = ?ids, "Issuing batch");
            let call = send(index, ids.clone());
            in_flight.push(async move { (index, ids, call.await) });
        }

        let Some((index, company_ids, result)) = in_flight.next().await else {
            break;
        };

        slots[index] = Some(match result {
            Ok(reported) => {
                if reported < company_ids.len() {
                    warn!(
                        batch_index = index,
                        requested = company_ids.len(),
                        reported,
                        "Store reported fewer moves than requested"
                    );
                }
                debug!(batch_index = index, batch_count = total, "Batch moved");
                BatchOutcome::Moved {
                    index,
                    company_ids,
                    reported,
                }
            }
            Err(e) => {
                let error = e.with_batch_index(index);
                warn!(batch_index = index, batch_count = total, error = %error, "Batch failed");
                failed = true;
                BatchOutcome::Failed {
                    index,
                    company_ids,
                    error,
                }
            }
        });
    }

    for (index, company_ids) in pending {
        slots[index] = Some(BatchOutcome::NotIssued { index, company_ids });
    }

    DispatchReport {
        outcomes: slots.into_iter().flatten().collect(),
    }
}
