// Stage Store: the board's working copy of leads and their stages
//
// Reassignments are optimistic. The lead's stage changes before the record
// store is asked, and a rejection restores the lead record captured right
// before that particular move. Moves of different leads never touch each
// other; for the same lead, a rejection never overwrites a newer move.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use futures::future::{FutureExt, LocalBoxFuture};
use thiserror::Error;
use crate::board::persistence::{PersistError, StagePersistence};
use crate::models::{Lead, Stage};

/// Why a reassignment did not stick
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReassignError {
    /// The lead is not part of the working set; nothing was changed
    #[error("unknown lead {0}")]
    UnknownLead(String),

    /// The record store refused the move; the lead was rolled back
    #[error(transparent)]
    Rejected(#[from] PersistError),
}

/// An optimistic move still waiting for the record store
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMove {
    pub seq: u64,
    pub lead_id: String,
    pub target_stage_id: String,
    /// Lead record to put back if this move is rejected
    restore: Lead,
    /// Move whose value was visible when this one was applied
    shadows: Option<u64>,
}

impl PendingMove {
    /// Stage the lead returns to if this move is rejected
    pub fn restore_stage_id(&self) -> Option<&str> {
        self.restore.stage_id.as_deref()
    }
}

#[derive(Debug, Clone, Copy)]
struct MoveTicket {
    seq: u64,
    epoch: u64,
}

#[derive(Debug, Default)]
struct WorkingSet {
    stages: Vec<Stage>,
    leads: Vec<Lead>,
    pending: Vec<PendingMove>,
    /// lead id -> move whose stage the lead currently shows
    visible: HashMap<String, u64>,
    next_seq: u64,
    /// Bumped by `initialize`; settlements from older sessions are ignored
    epoch: u64,
}

/// In-memory lead/stage state for one board session.
///
/// Single-threaded: the store lives behind `Rc` and is mutated through
/// `RefCell`, never across an `.await`.
pub struct StageStore {
    state: RefCell<WorkingSet>,
    persistence: Rc<dyn StagePersistence>,
}

impl StageStore {
    /// Create an empty store that persists moves through `persistence`
    pub fn new(persistence: Rc<dyn StagePersistence>) -> Self {
        Self {
            state: RefCell::new(WorkingSet::default()),
            persistence,
        }
    }

    /// Create a store already initialized with a snapshot
    pub fn with_snapshot(persistence: Rc<dyn StagePersistence>, leads: Vec<Lead>, stages: Vec<Stage>) -> Self {
        let store = Self::new(persistence);
        store.initialize(leads, stages);
        store
    }

    /// Replace the working state wholesale (board mount).
    ///
    /// Stage references are not validated; a lead pointing at an unknown
    /// stage shows up in `uncategorized()`.
    pub fn initialize(&self, leads: Vec<Lead>, stages: Vec<Stage>) {
        let mut state = self.state.borrow_mut();
        log::debug!("Board initialized with {} leads in {} stages", leads.len(), stages.len());
        state.leads = leads;
        state.stages = stages;
        state.pending.clear();
        state.visible.clear();
        state.epoch += 1;
    }

    /// Move a lead to another stage.
    ///
    /// The working set is updated before this returns. The returned future
    /// awaits the record store and, on rejection, rolls the lead back. An
    /// unknown lead resolves immediately to `UnknownLead` without calling the
    /// record store. Unknown target stages are accepted.
    pub fn reassign(
        self: &Rc<Self>,
        lead_id: &str,
        target_stage_id: &str,
    ) -> LocalBoxFuture<'static, Result<(), ReassignError>> {
        let applied = self.apply_optimistic(lead_id, target_stage_id);
        let store = Rc::clone(self);
        let lead_id = lead_id.to_string();
        let target_stage_id = target_stage_id.to_string();

        async move {
            let ticket = applied?;
            let result = store
                .persistence
                .persist_stage(&lead_id, &target_stage_id)
                .await;
            store.settle(ticket, result)
        }
        .boxed_local()
    }

    fn apply_optimistic(&self, lead_id: &str, target_stage_id: &str) -> Result<MoveTicket, ReassignError> {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;

        let Some(lead) = state.leads.iter_mut().find(|l| l.id == lead_id) else {
            log::warn!("Ignoring move of unknown lead {}", lead_id);
            return Err(ReassignError::UnknownLead(lead_id.to_string()));
        };

        let restore = lead.clone();
        lead.stage_id = Some(target_stage_id.to_string());

        let seq = state.next_seq;
        state.next_seq += 1;
        log::debug!(
            "Optimistic move #{}: lead {} {:?} -> {}",
            seq,
            lead_id,
            restore.stage_id,
            target_stage_id
        );

        let shadows = state.visible.insert(lead_id.to_string(), seq);
        state.pending.push(PendingMove {
            seq,
            lead_id: lead_id.to_string(),
            target_stage_id: target_stage_id.to_string(),
            restore,
            shadows,
        });

        Ok(MoveTicket { seq, epoch: state.epoch })
    }

    fn settle(&self, ticket: MoveTicket, result: Result<(), PersistError>) -> Result<(), ReassignError> {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;

        if state.epoch != ticket.epoch {
            log::debug!("Move #{} settled after the board was reinitialized; ignored", ticket.seq);
            return result.map_err(ReassignError::from);
        }
        let Some(idx) = state.pending.iter().position(|p| p.seq == ticket.seq) else {
            return result.map_err(ReassignError::from);
        };
        let settled = state.pending.remove(idx);

        let err = match result {
            Ok(()) => {
                log::debug!("Move #{} confirmed", settled.seq);
                return Ok(());
            }
            Err(err) => err,
        };

        log::warn!("Move #{} of lead {} rejected: {}", settled.seq, settled.lead_id, err);

        // A pending move applied on top of this one now falls back to
        // whatever this one would have restored.
        for later in state.pending.iter_mut() {
            if later.lead_id == settled.lead_id && later.shadows == Some(settled.seq) {
                later.restore = settled.restore.clone();
                later.shadows = settled.shadows;
            }
        }

        if state.visible.get(&settled.lead_id) == Some(&settled.seq) {
            if let Some(lead) = state.leads.iter_mut().find(|l| l.id == settled.lead_id) {
                *lead = settled.restore;
            }
            match settled.shadows {
                Some(prev) => state.visible.insert(settled.lead_id, prev),
                None => state.visible.remove(&settled.lead_id),
            };
        }

        Err(ReassignError::Rejected(err))
    }

    /// Leads in `stage_id`, in working-set order
    pub fn by_stage(&self, stage_id: &str) -> Vec<Lead> {
        self.state
            .borrow()
            .leads
            .iter()
            .filter(|l| l.is_in(stage_id))
            .cloned()
            .collect()
    }

    /// Leads whose stage id is set but not among the loaded stages
    pub fn uncategorized(&self) -> Vec<Lead> {
        let state = self.state.borrow();
        state
            .leads
            .iter()
            .filter(|l| match &l.stage_id {
                Some(id) => !state.stages.iter().any(|s| &s.id == id),
                None => false,
            })
            .cloned()
            .collect()
    }

    /// Leads with no stage at all
    pub fn unassigned(&self) -> Vec<Lead> {
        self.state
            .borrow()
            .leads
            .iter()
            .filter(|l| l.stage_id.is_none())
            .cloned()
            .collect()
    }

    /// Every lead's stage is either unset or one of the loaded stages
    pub fn is_consistent(&self) -> bool {
        self.uncategorized().is_empty()
    }

    pub fn stages(&self) -> Vec<Stage> {
        self.state.borrow().stages.clone()
    }

    pub fn stage(&self, stage_id: &str) -> Option<Stage> {
        self.state.borrow().stages.iter().find(|s| s.id == stage_id).cloned()
    }

    pub fn has_stage(&self, stage_id: &str) -> bool {
        self.state.borrow().stages.iter().any(|s| s.id == stage_id)
    }

    pub fn leads(&self) -> Vec<Lead> {
        self.state.borrow().leads.clone()
    }

    pub fn lead(&self, lead_id: &str) -> Option<Lead> {
        self.state.borrow().leads.iter().find(|l| l.id == lead_id).cloned()
    }

    /// Stage the lead currently shows; `None` for unknown or unassigned leads
    pub fn current_stage(&self, lead_id: &str) -> Option<String> {
        self.state
            .borrow()
            .leads
            .iter()
            .find(|l| l.id == lead_id)
            .and_then(|l| l.stage_id.clone())
    }

    pub fn len(&self) -> usize {
        self.state.borrow().leads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Moves still waiting for the record store, oldest first
    pub fn pending_moves(&self) -> Vec<PendingMove> {
        self.state.borrow().pending.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::channel::oneshot;
    use futures::executor::block_on;
    use std::task::{Context, Poll};

    type Reply = Result<(), PersistError>;

    /// Persistence whose calls stay pending until the test answers them
    #[derive(Default)]
    struct GatedPersistence {
        calls: RefCell<Vec<(String, String)>>,
        replies: RefCell<Vec<Option<oneshot::Sender<Reply>>>>,
    }

    impl GatedPersistence {
        fn answer(&self, call: usize, reply: Reply) {
            let sender = self.replies.borrow_mut()[call].take().unwrap();
            sender.send(reply).unwrap();
        }
    }

    #[async_trait(?Send)]
    impl StagePersistence for GatedPersistence {
        async fn persist_stage(&self, lead_id: &str, stage_id: &str) -> Reply {
            let (tx, rx) = oneshot::channel();
            self.calls.borrow_mut().push((lead_id.to_string(), stage_id.to_string()));
            self.replies.borrow_mut().push(Some(tx));
            rx.await.unwrap_or_else(|_| Err(PersistError::Unavailable("dropped".to_string())))
        }
    }

    fn poll_once(fut: &mut LocalBoxFuture<'static, Result<(), ReassignError>>) -> Poll<Result<(), ReassignError>> {
        let mut cx = Context::from_waker(futures::task::noop_waker_ref());
        fut.poll_unpin(&mut cx)
    }

    fn stages() -> Vec<Stage> {
        vec![
            Stage::with_id("s1", "Novo", 0),
            Stage::with_id("s2", "Contato", 1),
            Stage::with_id("s3", "Visita", 2),
        ]
    }

    fn ids(leads: &[Lead]) -> Vec<&str> {
        leads.iter().map(|l| l.id.as_str()).collect()
    }

    fn setup(leads: Vec<Lead>) -> (Rc<GatedPersistence>, Rc<StageStore>) {
        let persistence = Rc::new(GatedPersistence::default());
        let store = Rc::new(StageStore::with_snapshot(persistence.clone(), leads, stages()));
        (persistence, store)
    }

    #[test]
    fn test_by_stage_keeps_insertion_order() {
        let (_p, store) = setup(vec![
            Lead::with_id("L1", "Ana").in_stage("s1"),
            Lead::with_id("L2", "Bia").in_stage("s2"),
            Lead::with_id("L3", "Caio").in_stage("s1"),
            Lead::with_id("L4", "Duda"),
        ]);

        assert_eq!(ids(&store.by_stage("s1")), vec!["L1", "L3"]);
        assert_eq!(ids(&store.by_stage("s2")), vec!["L2"]);
        assert!(store.by_stage("s3").is_empty());
        assert_eq!(ids(&store.unassigned()), vec!["L4"]);
    }

    #[test]
    fn test_optimistic_move_visible_before_confirmation() {
        let (persistence, store) = setup(vec![Lead::with_id("L1", "Ana").in_stage("s1")]);

        let mut fut = store.reassign("L1", "s2");
        assert_eq!(ids(&store.by_stage("s2")), vec!["L1"]);
        assert!(store.by_stage("s1").is_empty());
        assert_eq!(store.current_stage("L1").as_deref(), Some("s2"));
        assert!(store.current_stage("nope").is_none());
        assert!(persistence.calls.borrow().is_empty());

        assert!(poll_once(&mut fut).is_pending());
        assert_eq!(*persistence.calls.borrow(), vec![("L1".to_string(), "s2".to_string())]);
        assert_eq!(store.pending_moves().len(), 1);

        persistence.answer(0, Ok(()));
        assert_eq!(block_on(fut), Ok(()));
        assert_eq!(ids(&store.by_stage("s2")), vec!["L1"]);
        assert!(store.pending_moves().is_empty());
    }

    #[test]
    fn test_rejection_restores_previous_grouping() {
        let (persistence, store) = setup(vec![
            Lead::with_id("L1", "Ana").in_stage("s1"),
            Lead::with_id("L2", "Bia").in_stage("s1"),
        ]);
        let before = store.leads();

        let mut fut = store.reassign("L1", "s3");
        assert!(poll_once(&mut fut).is_pending());
        persistence.answer(0, Err(PersistError::PermissionDenied));

        assert_eq!(
            block_on(fut),
            Err(ReassignError::Rejected(PersistError::PermissionDenied))
        );
        assert_eq!(store.leads(), before);
        assert_eq!(ids(&store.by_stage("s1")), vec!["L1", "L2"]);
        assert!(store.by_stage("s3").is_empty());
    }

    #[test]
    fn test_unknown_lead_is_noop() {
        let (persistence, store) = setup(vec![Lead::with_id("L1", "Ana").in_stage("s1")]);
        let before = store.leads();

        let result = block_on(store.reassign("nope", "s2"));
        assert_eq!(result, Err(ReassignError::UnknownLead("nope".to_string())));
        assert_eq!(store.leads(), before);
        assert!(persistence.calls.borrow().is_empty());
        assert!(store.pending_moves().is_empty());
    }

    #[test]
    fn test_unknown_target_stage_is_accepted() {
        let (persistence, store) = setup(vec![Lead::with_id("L1", "Ana").in_stage("s1")]);
        assert!(store.is_consistent());

        let mut fut = store.reassign("L1", "ghost");
        assert!(poll_once(&mut fut).is_pending());
        assert!(store.stages().iter().all(|s| store.by_stage(&s.id).is_empty()));
        assert_eq!(ids(&store.uncategorized()), vec!["L1"]);
        assert!(!store.is_consistent());

        persistence.answer(0, Ok(()));
        assert_eq!(block_on(fut), Ok(()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_rejection_does_not_touch_other_leads() {
        let (persistence, store) = setup(vec![
            Lead::with_id("A", "Ana").in_stage("s1"),
            Lead::with_id("B", "Bia").in_stage("s1"),
        ]);

        let mut move_a = store.reassign("A", "s2");
        assert!(poll_once(&mut move_a).is_pending());
        let mut move_b = store.reassign("B", "s3");
        assert!(poll_once(&mut move_b).is_pending());

        persistence.answer(0, Err(PersistError::NotFound));
        assert!(block_on(move_a).is_err());
        assert_eq!(ids(&store.by_stage("s1")), vec!["A"]);
        assert_eq!(ids(&store.by_stage("s3")), vec!["B"]);

        persistence.answer(1, Ok(()));
        assert_eq!(block_on(move_b), Ok(()));
        assert_eq!(ids(&store.by_stage("s3")), vec!["B"]);
    }

    #[test]
    fn test_late_rejection_keeps_newer_move_of_same_lead() {
        let (persistence, store) = setup(vec![Lead::with_id("L1", "Ana").in_stage("s1")]);

        let mut first = store.reassign("L1", "s2");
        assert!(poll_once(&mut first).is_pending());
        let mut second = store.reassign("L1", "s3");
        assert!(poll_once(&mut second).is_pending());

        persistence.answer(0, Err(PersistError::Unavailable("timeout".to_string())));
        assert!(block_on(first).is_err());
        assert_eq!(ids(&store.by_stage("s3")), vec!["L1"]);

        // The newer move inherits the original restore point
        let pending = store.pending_moves();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].restore_stage_id(), Some("s1"));

        persistence.answer(1, Err(PersistError::PermissionDenied));
        assert!(block_on(second).is_err());
        assert_eq!(ids(&store.by_stage("s1")), vec!["L1"]);
    }

    #[test]
    fn test_newer_rejection_falls_back_to_older_pending_move() {
        let (persistence, store) = setup(vec![Lead::with_id("L1", "Ana").in_stage("s1")]);

        let mut first = store.reassign("L1", "s2");
        assert!(poll_once(&mut first).is_pending());
        let mut second = store.reassign("L1", "s3");
        assert!(poll_once(&mut second).is_pending());

        persistence.answer(1, Err(PersistError::PermissionDenied));
        assert!(block_on(second).is_err());
        assert_eq!(ids(&store.by_stage("s2")), vec!["L1"]);

        persistence.answer(0, Err(PersistError::PermissionDenied));
        assert!(block_on(first).is_err());
        assert_eq!(ids(&store.by_stage("s1")), vec!["L1"]);
    }

    #[test]
    fn test_older_rejection_after_newer_confirmation_keeps_newer() {
        let (persistence, store) = setup(vec![Lead::with_id("L1", "Ana").in_stage("s1")]);

        let mut first = store.reassign("L1", "s2");
        assert!(poll_once(&mut first).is_pending());
        let mut second = store.reassign("L1", "s3");
        assert!(poll_once(&mut second).is_pending());

        persistence.answer(1, Ok(()));
        assert_eq!(block_on(second), Ok(()));
        persistence.answer(0, Err(PersistError::NotFound));
        assert!(block_on(first).is_err());

        assert_eq!(ids(&store.by_stage("s3")), vec!["L1"]);
        assert!(store.pending_moves().is_empty());
    }

    #[test]
    fn test_settlement_after_reinitialize_is_ignored() {
        let (persistence, store) = setup(vec![Lead::with_id("L1", "Ana").in_stage("s1")]);

        let mut fut = store.reassign("L1", "s2");
        assert!(poll_once(&mut fut).is_pending());

        store.initialize(vec![Lead::with_id("L1", "Ana").in_stage("s3")], stages());
        persistence.answer(0, Err(PersistError::PermissionDenied));
        assert!(block_on(fut).is_err());

        assert_eq!(ids(&store.by_stage("s3")), vec!["L1"]);
    }

    #[test]
    fn test_move_never_changes_cardinality() {
        let (persistence, store) = setup(vec![
            Lead::with_id("L1", "Ana").in_stage("s1"),
            Lead::with_id("L2", "Bia"),
        ]);

        let mut fut = store.reassign("L2", "s2");
        assert_eq!(store.len(), 2);
        assert!(poll_once(&mut fut).is_pending());
        persistence.answer(0, Err(PersistError::Validation("stale".to_string())));
        assert!(block_on(fut).is_err());
        assert_eq!(store.len(), 2);
        assert!(store.lead("L2").unwrap().stage_id.is_none());
    }
}
