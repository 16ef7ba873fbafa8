//! Reliable moves of selected or all members between collections.
//!
//! A move runs through `Idle -> Validating -> InFlight(chunk i of n)` and
//! ends in `Succeeded`, `PartiallyFailed` or `Rejected`. Rejections never
//! reach the store. Success clears the selection and reloads the view;
//! failure leaves both untouched.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use jam_core::{
    BatchOutcome, CollectionId, CompanyId, Error, MoveOutcome, MoveRequest, MoveTargets,
    PartialMoveFailure, RemoteCall, RemoteCollectionClient, Result, SelectionSet,
    TransportError,
};

use crate::batching::{dispatch, partition, BatchStrategy};
use crate::config::WorkflowConfig;
use crate::view::{LoadOutcome, PaginatedMembershipView};

/// Progress of the current or most recent move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveState {
    #[default]
    Idle,
    Validating,
    /// One-based chunk number most recently issued, out of `of`.
    InFlight { chunk: usize, of: usize },
    Succeeded { moved_count: usize },
    PartiallyFailed {
        moved_count: usize,
        not_moved_count: usize,
    },
    /// A precondition failed; nothing was sent.
    Rejected,
}

impl MoveState {
    /// True from validation until the move resolves.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Validating | Self::InFlight { .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded { .. } | Self::PartiallyFailed { .. } | Self::Rejected
        )
    }

    /// Transitions only go forward.
    pub fn can_transition_to(&self, next: &MoveState) -> bool {
        match (self, next) {
            (Self::Idle, Self::Validating) => true,
            (s, Self::Validating) if s.is_terminal() => true,
            (Self::Validating, Self::InFlight { chunk: 1, .. }) => true,
            (Self::Validating, Self::Rejected) => true,
            (Self::InFlight { chunk, of }, Self::InFlight { chunk: to, of: to_of }) => {
                of == to_of && to > chunk && to <= to_of
            }
            (Self::InFlight { .. }, Self::Succeeded { .. } | Self::PartiallyFailed { .. }) => true,
            _ => false,
        }
    }
}

/// Executes moves against the store and owns the pending selection.
pub struct BatchMoveCoordinator<C> {
    client: Arc<C>,
    view: PaginatedMembershipView<C>,
    selection: Mutex<SelectionSet>,
    batch_size: usize,
    strategy: BatchStrategy,
    state: watch::Sender<MoveState>,
}

impl<C: RemoteCollectionClient> BatchMoveCoordinator<C> {
    pub fn new(client: Arc<C>, view: PaginatedMembershipView<C>, config: &WorkflowConfig) -> Self {
        let (state, _) = watch::channel(MoveState::Idle);
        Self {
            client,
            view,
            selection: Mutex::new(SelectionSet::default()),
            batch_size: config.batch_size,
            strategy: config.strategy,
            state,
        }
    }

    /// Watch move state changes; the busy flag is `state.is_busy()`.
    pub fn subscribe(&self) -> watch::Receiver<MoveState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> MoveState {
        *self.state.borrow()
    }

    pub fn is_busy(&self) -> bool {
        self.state.borrow().is_busy()
    }

    pub fn view(&self) -> &PaginatedMembershipView<C> {
        &self.view
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    // =========================================================================
    // SELECTION
    // =========================================================================

    /// Replace the selection with `ids` from the current window.
    pub async fn select(&self, ids: impl IntoIterator<Item = CompanyId>) {
        let window = self.view.window().await;
        *self.selection.lock().await = SelectionSet::new(window, ids);
    }

    pub async fn toggle(&self, id: CompanyId) {
        let window = self.view.window().await;
        self.selection.lock().await.toggle(window, id);
    }

    /// Ids still selected for the window currently shown.
    pub async fn selected(&self) -> Vec<CompanyId> {
        let window = self.view.window().await;
        self.selection.lock().await.ids_for(&window).to_vec()
    }

    pub async fn clear_selection(&self) {
        self.selection.lock().await.invalidate();
    }

    /// Show another collection; the selection does not carry over.
    pub async fn switch_collection(&self, collection_id: CollectionId) -> Result<LoadOutcome> {
        self.clear_selection().await;
        self.view.switch_collection(collection_id).await
    }

    /// Change the page window; the selection does not carry over.
    pub async fn set_window(&self, offset: usize, page_size: usize) -> Result<LoadOutcome> {
        self.clear_selection().await;
        self.view.set_window(offset, page_size).await
    }

    // =========================================================================
    // MOVES
    // =========================================================================

    /// Move `ids` in chunks of at most the batch size, in the given order.
    ///
    /// A failed chunk stops all later chunks. With more than one chunk the
    /// failure is reported as a partial move naming every id that did not
    /// move.
    pub async fn move_selected(
        &self,
        source: CollectionId,
        destination: Option<CollectionId>,
        ids: Vec<CompanyId>,
    ) -> Result<MoveOutcome> {
        self.execute(MoveRequest::selected(source, destination, ids)).await
    }

    /// Move the current selection out of the collection on view.
    pub async fn move_selection(&self, destination: Option<CollectionId>) -> Result<MoveOutcome> {
        let window = self.view.window().await;
        let ids = self.selection.lock().await.ids_for(&window).to_vec();
        self.move_selected(window.collection_id, destination, ids).await
    }

    /// Move every member of `source` in one store call.
    pub async fn move_all(
        &self,
        source: CollectionId,
        destination: Option<CollectionId>,
    ) -> Result<MoveOutcome> {
        self.execute(MoveRequest::all(source, destination)).await
    }

    async fn execute(&self, request: MoveRequest) -> Result<MoveOutcome> {
        self.begin()?;

        let (destination, chunks) = match self.plan(&request) {
            Ok(plan) => plan,
            Err(e) => {
                debug!(source_id = %request.source, error = %e, "Move rejected");
                self.transition(MoveState::Rejected);
                return Err(e);
            }
        };

        let started_at = Utc::now();
        let result = match chunks {
            Some(chunks) => self.move_chunks(request.source, destination, chunks).await,
            None => self.move_all_members(request.source, destination).await,
        };

        match result {
            Ok((moved_count, batches)) => {
                self.transition(MoveState::Succeeded { moved_count });
                info!(
                    source_id = %request.source,
                    destination_id = %destination,
                    moved_count,
                    batch_count = batches.len(),
                    "Move completed"
                );
                self.after_success().await;
                Ok(MoveOutcome {
                    moved_count,
                    batches,
                    started_at,
                    finished_at: Utc::now(),
                })
            }
            Err(e) => {
                let not_moved_count = match &e {
                    Error::PartialMove(failure) => failure.not_moved.len(),
                    _ => match &request.targets {
                        MoveTargets::Selected(ids) => ids.len(),
                        MoveTargets::All => 0,
                    },
                };
                self.transition(MoveState::PartiallyFailed {
                    moved_count: e.moved_count(),
                    not_moved_count,
                });
                warn!(
                    source_id = %request.source,
                    destination_id = %destination,
                    moved_count = e.moved_count(),
                    not_moved_count,
                    error = %e,
                    "Move failed"
                );
                Err(e)
            }
        }
    }

    /// Enter `Validating` unless a move is already running.
    fn begin(&self) -> Result<()> {
        let mut started = false;
        self.state.send_if_modified(|state| {
            if state.is_busy() {
                return false;
            }
            *state = MoveState::Validating;
            started = true;
            true
        });
        if started {
            Ok(())
        } else {
            Err(Error::InvalidInput("a move is already in progress".to_string()))
        }
    }

    fn transition(&self, next: MoveState) {
        self.state.send_modify(|state| {
            debug_assert!(
                state.can_transition_to(&next),
                "illegal move state transition {:?} -> {:?}",
                state,
                next
            );
            *state = next;
        });
    }

    /// Validate the request and split selected ids into chunks.
    fn plan(&self, request: &MoveRequest) -> Result<(CollectionId, Option<Vec<Vec<CompanyId>>>)> {
        let destination = request.validate()?;
        let chunks = match &request.targets {
            MoveTargets::Selected(ids) => Some(partition(ids, self.batch_size)?),
            MoveTargets::All => None,
        };
        Ok((destination, chunks))
    }

    async fn move_chunks(
        &self,
        source: CollectionId,
        destination: CollectionId,
        chunks: Vec<Vec<CompanyId>>,
    ) -> Result<(usize, Vec<BatchOutcome>)> {
        let batch_count = chunks.len();
        debug!(
            source_id = %source,
            destination_id = %destination,
            batch_count,
            batch_size = self.batch_size,
            "Dispatching move"
        );

        let client = &self.client;
        let report = dispatch(
            chunks,
            self.strategy,
            |index, of| self.transition(MoveState::InFlight { chunk: index + 1, of }),
            |_, ids| async move { client.move_batch(source, destination, &ids).await },
        )
        .await;

        if report.is_complete() {
            return Ok((report.moved_count(), report.outcomes));
        }

        let cause = report
            .first_failure()
            .cloned()
            .unwrap_or_else(|| TransportError::new(RemoteCall::MoveBatch, "batch failed"));

        if batch_count == 1 {
            return Err(Error::Transport(cause));
        }

        Err(PartialMoveFailure {
            moved_count: report.moved_count(),
            not_moved: report.not_moved(),
            batches: report.outcomes,
            cause,
        }
        .into())
    }

    async fn move_all_members(
        &self,
        source: CollectionId,
        destination: CollectionId,
    ) -> Result<(usize, Vec<BatchOutcome>)> {
        self.transition(MoveState::InFlight { chunk: 1, of: 1 });
        let moved_count = self.client.move_all_members(source, destination).await?;
        Ok((moved_count, Vec::new()))
    }

    /// Moved rows may shift pages and the total, so the window is re-fetched
    /// rather than patched.
    async fn after_success(&self) {
        self.clear_selection().await;
        if let Err(e) = self.view.reload().await {
            warn!(error = %e, "Reload after move failed");
        }
    }
}
