// Column/card presentation state derived from the store and the drag session

use serde::Serialize;
use crate::board::drag::DragController;
use crate::board::store::StageStore;
use crate::models::{Lead, Stage};
use crate::utils::format_brl_compact;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardView {
    pub lead: Lead,
    pub is_dragging: bool,
    pub phone_label: String,
    /// Compact BRL label; absent when the lead has no (or a zero) interest value
    pub value_label: Option<String>,
}

impl CardView {
    pub fn new(lead: Lead, is_dragging: bool) -> Self {
        let phone_label = lead
            .phone
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or("N/A")
            .to_string();
        let value_label = lead
            .interest_value
            .filter(|v| *v != 0.0)
            .map(format_brl_compact);
        Self {
            lead,
            is_dragging,
            phone_label,
            value_label,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnView {
    pub stage: Stage,
    pub cards: Vec<CardView>,
    pub count: usize,
    /// The dragged card is hovering over this column
    pub is_over: bool,
    pub total_value: f64,
}

impl ColumnView {
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// One column per loaded stage, ordered by position
pub fn board_columns(store: &StageStore, drag: &DragController) -> Vec<ColumnView> {
    let mut stages = store.stages();
    stages.sort_by_key(|s| s.position);

    let active = drag.active_lead_id();
    let hover = drag.hover_stage_id();

    stages
        .into_iter()
        .map(|stage| {
            let cards: Vec<CardView> = store
                .by_stage(&stage.id)
                .into_iter()
                .map(|lead| {
                    let is_dragging = active == Some(lead.id.as_str());
                    CardView::new(lead, is_dragging)
                })
                .collect();
            let total_value = cards.iter().filter_map(|c| c.lead.interest_value).sum();
            ColumnView {
                is_over: hover == Some(stage.id.as_str()),
                count: cards.len(),
                cards,
                total_value,
                stage,
            }
        })
        .collect()
}

/// The card following the pointer during a drag
pub fn drag_overlay(store: &StageStore, drag: &DragController) -> Option<CardView> {
    drag.active_lead_id()
        .and_then(|id| store.lead(id))
        .map(|lead| CardView::new(lead, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::persistence::{PersistError, StagePersistence};
    use async_trait::async_trait;
    use std::rc::Rc;

    struct Accepting;

    #[async_trait(?Send)]
    impl StagePersistence for Accepting {
        async fn persist_stage(&self, _lead_id: &str, _stage_id: &str) -> Result<(), PersistError> {
            Ok(())
        }
    }

    fn store() -> StageStore {
        StageStore::with_snapshot(
            Rc::new(Accepting),
            vec![
                Lead::with_id("L1", "Ana").in_stage("s1").with_phone("11 91234-5678").with_interest_value(1_500_000.0),
                Lead::with_id("L2", "Bia").in_stage("s1").with_interest_value(250_000.0),
                Lead::with_id("L3", "Caio").in_stage("s2").with_interest_value(0.0),
            ],
            // Deliberately out of position order
            vec![Stage::with_id("s2", "Contato", 1), Stage::with_id("s1", "Novo", 0), Stage::with_id("s3", "Visita", 2)],
        )
    }

    #[test]
    fn test_columns_follow_position() {
        let columns = board_columns(&store(), &DragController::new());
        let names: Vec<&str> = columns.iter().map(|c| c.stage.name.as_str()).collect();
        assert_eq!(names, vec!["Novo", "Contato", "Visita"]);
        assert_eq!(columns[0].count, 2);
        assert_eq!(columns[0].total_value, 1_750_000.0);
        assert!(columns[2].is_empty());
    }

    #[test]
    fn test_card_labels() {
        let columns = board_columns(&store(), &DragController::new());
        let ana = &columns[0].cards[0];
        assert_eq!(ana.phone_label, "11 91234-5678");
        assert_eq!(ana.value_label.as_deref(), Some("R$ 1,5 mi"));

        let bia = &columns[0].cards[1];
        assert_eq!(bia.phone_label, "N/A");
        assert_eq!(bia.value_label.as_deref(), Some("R$ 250 mil"));

        // Zero interest is not shown
        assert!(columns[1].cards[0].value_label.is_none());
    }

    #[test]
    fn test_drag_flags() {
        let store = store();
        let mut drag = DragController::new();
        drag.begin("L2", &store);
        drag.hover(Some("s2"), &store);

        let columns = board_columns(&store, &drag);
        assert!(!columns[0].is_over);
        assert!(columns[1].is_over);
        assert!(columns[0].cards[1].is_dragging);
        assert!(!columns[0].cards[0].is_dragging);

        let overlay = drag_overlay(&store, &drag).unwrap();
        assert_eq!(overlay.lead.id, "L2");
        assert!(overlay.is_dragging);
    }

    #[test]
    fn test_no_overlay_when_idle() {
        assert!(drag_overlay(&store(), &DragController::new()).is_none());
    }
}
