//! The lead pipeline board.
//!
//! - [`store::StageStore`]: working copy of leads/stages with optimistic reassignment
//! - [`drag::DragController`]: one drag session at a time, drop -> move request
//! - [`sensor::PointerSensor`]: raw pointer input -> drag events, click vs. drag
//! - [`view`]: column/card presentation state
//!
//! [`Board`] ties them together: it receives the sensor's events, commits
//! drops to the store without waiting for the record store, and reports
//! rejected moves through a [`notify::Notifier`].

pub mod drag;
pub mod notify;
pub mod persistence;
pub mod sensor;
pub mod store;
pub mod view;

use std::rc::Rc;
use futures::task::{LocalSpawn, LocalSpawnExt};

pub use drag::{CancelReason, DragController, DragState, DropOutcome, MoveRequest};
pub use notify::{ConsoleNotifier, MemoryNotifier, Notifier};
pub use persistence::{PersistError, SqlitePersistence, StagePersistence};
pub use sensor::{DragHandler, Point, PointerSensor};
pub use store::{PendingMove, ReassignError, StageStore};
pub use view::{board_columns, drag_overlay, CardView, ColumnView};

/// Board session: store + drag controller + notification channel.
///
/// Confirmations run on the local executor behind `spawner`; the board only
/// spawns them.
pub struct Board<S: LocalSpawn> {
    store: Rc<StageStore>,
    drag: DragController,
    notifier: Rc<dyn Notifier>,
    spawner: S,
    selected_lead_id: Option<String>,
    last_drop: Option<DropOutcome>,
}

impl<S: LocalSpawn> Board<S> {
    pub fn new(store: Rc<StageStore>, notifier: Rc<dyn Notifier>, spawner: S) -> Self {
        Self {
            store,
            drag: DragController::new(),
            notifier,
            spawner,
            selected_lead_id: None,
            last_drop: None,
        }
    }

    pub fn store(&self) -> &Rc<StageStore> {
        &self.store
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    /// Lead whose details were requested by a click
    pub fn selected_lead_id(&self) -> Option<&str> {
        self.selected_lead_id.as_deref()
    }

    pub fn close_details(&mut self) {
        self.selected_lead_id = None;
    }

    /// How the most recent drop ended
    pub fn last_drop(&self) -> Option<&DropOutcome> {
        self.last_drop.as_ref()
    }

    pub fn columns(&self) -> Vec<ColumnView> {
        board_columns(&self.store, &self.drag)
    }

    pub fn overlay(&self) -> Option<CardView> {
        drag_overlay(&self.store, &self.drag)
    }

    fn commit(&mut self, request: MoveRequest) {
        log::debug!(
            "Committing lead {} {:?} -> {}",
            request.lead_id,
            request.from_stage_id,
            request.to_stage_id
        );
        let confirmation = self.store.reassign(&request.lead_id, &request.to_stage_id);
        let notifier = Rc::clone(&self.notifier);

        let spawned = self.spawner.spawn_local(async move {
            if let Err(err) = confirmation.await {
                notifier.notify_error(&format!("Failed to move lead: {}", err));
            }
        });
        if let Err(err) = spawned {
            // The optimistic value stays; nobody will confirm or roll it back
            log::error!("Could not schedule confirmation of lead {}: {}", request.lead_id, err);
        }
    }
}

impl<S: LocalSpawn> DragHandler for Board<S> {
    fn on_drag_start(&mut self, lead_id: &str) {
        self.drag.begin(lead_id, &self.store);
    }

    fn on_drag_over(&mut self, stage_id: Option<&str>) {
        self.drag.hover(stage_id, &self.store);
    }

    fn on_drop(&mut self) {
        let outcome = self.drag.release(&self.store);
        match &outcome {
            DropOutcome::Commit(request) => self.commit(request.clone()),
            DropOutcome::Cancelled(reason) => log::debug!("Drop cancelled: {:?}", reason),
        }
        self.last_drop = Some(outcome);
    }

    fn on_cancel(&mut self) {
        if self.drag.cancel() {
            log::debug!("Drag aborted");
        }
    }

    fn on_click(&mut self, lead_id: &str) {
        if self.drag.is_dragging() {
            return;
        }
        if self.store.lead(lead_id).is_some() {
            self.selected_lead_id = Some(lead_id.to_string());
        }
    }
}
