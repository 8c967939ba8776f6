// Drag Session Controller
//
// Idle <-> Dragging { lead, hover }. Only one session exists at a time. The
// controller reads lead and stage data from the store but never writes it;
// a committed drop is handed back to the caller as a `MoveRequest`.

use crate::board::store::StageStore;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        lead_id: String,
        /// Stage under the pointer, `None` when over no valid drop target
        hover_stage_id: Option<String>,
    },
}

/// A drop that should become a reassignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRequest {
    pub lead_id: String,
    pub from_stage_id: Option<String>,
    pub to_stage_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// Released over no drop target
    NoTarget,
    /// Released over the stage the lead is already in
    SameStage,
    /// The lead left the working set while being dragged
    LeadGone,
    /// Release without an active drag session
    NotDragging,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    Commit(MoveRequest),
    Cancelled(CancelReason),
}

#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn active_lead_id(&self) -> Option<&str> {
        match &self.state {
            DragState::Dragging { lead_id, .. } => Some(lead_id.as_str()),
            DragState::Idle => None,
        }
    }

    pub fn hover_stage_id(&self) -> Option<&str> {
        match &self.state {
            DragState::Dragging { hover_stage_id, .. } => hover_stage_id.as_deref(),
            DragState::Idle => None,
        }
    }

    /// Start a session for `lead_id`.
    /// Returns false (and changes nothing) while another session is active
    /// or when the lead is not on the board.
    pub fn begin(&mut self, lead_id: &str, store: &StageStore) -> bool {
        if self.is_dragging() {
            log::debug!("Drag of {} refused: a session is already active", lead_id);
            return false;
        }
        if store.lead(lead_id).is_none() {
            log::debug!("Drag of unknown lead {} refused", lead_id);
            return false;
        }
        self.state = DragState::Dragging {
            lead_id: lead_id.to_string(),
            hover_stage_id: None,
        };
        true
    }

    /// Track the stage under the pointer. Ids that are not loaded stages
    /// count as no target.
    pub fn hover(&mut self, stage_id: Option<&str>, store: &StageStore) {
        if let DragState::Dragging { hover_stage_id, .. } = &mut self.state {
            *hover_stage_id = stage_id
                .filter(|id| store.has_stage(id))
                .map(str::to_string);
        }
    }

    /// End the session on pointer release. Always returns to Idle.
    pub fn release(&mut self, store: &StageStore) -> DropOutcome {
        let DragState::Dragging { lead_id, hover_stage_id } = std::mem::take(&mut self.state) else {
            return DropOutcome::Cancelled(CancelReason::NotDragging);
        };

        let Some(target) = hover_stage_id else {
            return DropOutcome::Cancelled(CancelReason::NoTarget);
        };
        let Some(lead) = store.lead(&lead_id) else {
            return DropOutcome::Cancelled(CancelReason::LeadGone);
        };
        if lead.is_in(&target) {
            return DropOutcome::Cancelled(CancelReason::SameStage);
        }

        DropOutcome::Commit(MoveRequest {
            lead_id,
            from_stage_id: lead.stage_id,
            to_stage_id: target,
        })
    }

    /// Abort the session without touching the store.
    /// Returns whether a session was active.
    pub fn cancel(&mut self) -> bool {
        let was_dragging = self.is_dragging();
        self.state = DragState::Idle;
        was_dragging
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::persistence::{PersistError, StagePersistence};
    use crate::models::{Lead, Stage};
    use async_trait::async_trait;
    use std::rc::Rc;

    struct NeverCalled;

    #[async_trait(?Send)]
    impl StagePersistence for NeverCalled {
        async fn persist_stage(&self, _lead_id: &str, _stage_id: &str) -> Result<(), PersistError> {
            panic!("the controller must not persist anything");
        }
    }

    fn store() -> StageStore {
        StageStore::with_snapshot(
            Rc::new(NeverCalled),
            vec![
                Lead::with_id("L1", "Ana").in_stage("s1"),
                Lead::with_id("L2", "Bia").in_stage("s2"),
            ],
            vec![Stage::with_id("s1", "Novo", 0), Stage::with_id("s2", "Contato", 1)],
        )
    }

    #[test]
    fn test_starts_idle() {
        let drag = DragController::new();
        assert_eq!(drag.state(), &DragState::Idle);
        assert!(drag.active_lead_id().is_none());
        assert!(drag.hover_stage_id().is_none());
    }

    #[test]
    fn test_commit_on_other_stage() {
        let store = store();
        let mut drag = DragController::new();

        assert!(drag.begin("L1", &store));
        drag.hover(Some("s1"), &store);
        drag.hover(Some("s2"), &store);
        assert_eq!(drag.hover_stage_id(), Some("s2"));

        let outcome = drag.release(&store);
        assert_eq!(
            outcome,
            DropOutcome::Commit(MoveRequest {
                lead_id: "L1".to_string(),
                from_stage_id: Some("s1".to_string()),
                to_stage_id: "s2".to_string(),
            })
        );
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_drop_on_own_stage_cancels() {
        let store = store();
        let mut drag = DragController::new();
        drag.begin("L1", &store);
        drag.hover(Some("s1"), &store);
        assert_eq!(drag.release(&store), DropOutcome::Cancelled(CancelReason::SameStage));
        assert_eq!(drag.state(), &DragState::Idle);
    }

    #[test]
    fn test_drop_outside_targets_cancels() {
        let store = store();
        let mut drag = DragController::new();
        drag.begin("L1", &store);
        drag.hover(Some("s2"), &store);
        drag.hover(None, &store);
        assert_eq!(drag.release(&store), DropOutcome::Cancelled(CancelReason::NoTarget));
    }

    #[test]
    fn test_unknown_stage_is_not_a_target() {
        let store = store();
        let mut drag = DragController::new();
        drag.begin("L1", &store);
        drag.hover(Some("trash"), &store);
        assert!(drag.hover_stage_id().is_none());
        assert_eq!(drag.release(&store), DropOutcome::Cancelled(CancelReason::NoTarget));
    }

    #[test]
    fn test_single_session() {
        let store = store();
        let mut drag = DragController::new();
        assert!(drag.begin("L1", &store));
        assert!(!drag.begin("L2", &store));
        assert_eq!(drag.active_lead_id(), Some("L1"));
    }

    #[test]
    fn test_unknown_lead_cannot_be_dragged() {
        let store = store();
        let mut drag = DragController::new();
        assert!(!drag.begin("ghost", &store));
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_cancel_ignores_hover() {
        let store = store();
        let mut drag = DragController::new();
        drag.begin("L1", &store);
        drag.hover(Some("s2"), &store);
        assert!(drag.cancel());
        assert!(!drag.cancel());
        assert_eq!(drag.release(&store), DropOutcome::Cancelled(CancelReason::NotDragging));
        assert_eq!(store.by_stage("s1").len(), 1);
    }

    #[test]
    fn test_lead_removed_mid_drag() {
        let store = store();
        let mut drag = DragController::new();
        drag.begin("L1", &store);
        drag.hover(Some("s2"), &store);
        store.initialize(vec![], store.stages());
        assert_eq!(drag.release(&store), DropOutcome::Cancelled(CancelReason::LeadGone));
    }
}
