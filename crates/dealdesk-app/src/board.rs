// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::model::{Deal, Stage};

/// One entry per stage in `Stage::ALL` order; stages with no deals
/// still appear so empty columns render.
pub fn group_by_stage(deals: &[Deal]) -> Vec<(Stage, Vec<&Deal>)> {
    Stage::ALL
        .into_iter()
        .map(|stage| {
            let column = deals.iter().filter(|deal| deal.stage == stage).collect();
            (stage, column)
        })
        .collect()
}

/// The one enforced rule of the pipeline: terminal stages are reached,
/// never departed. Everything else moves freely in either direction.
pub const fn can_transition(from: Stage, _to: Stage) -> bool {
    !from.is_terminal()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePlan {
    /// The deal sits in a closed stage; the list must not change.
    RejectedTerminal,
    /// Dropping a card on its own column.
    NoOp,
    /// Closing a deal as won needs an explicit user confirmation.
    NeedsConfirmation,
    Apply,
}

pub fn plan_move(deal: &Deal, target: Stage) -> MovePlan {
    if !can_transition(deal.stage, target) {
        return MovePlan::RejectedTerminal;
    }
    if target == deal.stage {
        return MovePlan::NoOp;
    }
    if target == Stage::ClosedWon {
        return MovePlan::NeedsConfirmation;
    }
    MovePlan::Apply
}

/// "Mark lost" is a move to `ClosedLost` that always asks first.
pub fn plan_mark_lost(deal: &Deal) -> MovePlan {
    if deal.stage.is_terminal() {
        return MovePlan::RejectedTerminal;
    }
    MovePlan::NeedsConfirmation
}

#[cfg(test)]
mod tests {
    use super::{MovePlan, can_transition, group_by_stage, plan_mark_lost, plan_move};
    use crate::ids::DealId;
    use crate::model::{Deal, Priority, Stage};
    use time::{Date, Month};

    fn deal_in(stage: Stage) -> Deal {
        Deal {
            id: DealId::for_demo(0),
            company: "Acme".to_owned(),
            contact_person: String::new(),
            description: String::new(),
            value_cents: 100_000,
            probability: 50,
            stage,
            priority: Priority::Medium,
            assignees: Vec::new(),
            due_date: Date::from_calendar_date(2026, Month::May, 1).expect("valid date"),
            days_in_stage: 3,
            comments: 0,
            attachments: 0,
            created_by: String::new(),
            updated_by: String::new(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn grouping_keeps_empty_columns() {
        let deals = vec![deal_in(Stage::Proposal), deal_in(Stage::Proposal)];
        let columns = group_by_stage(&deals);
        assert_eq!(columns.len(), Stage::ALL.len());
        let stages: Vec<Stage> = columns.iter().map(|(stage, _)| *stage).collect();
        assert_eq!(stages, Stage::ALL.to_vec());

        let proposal = columns
            .iter()
            .find(|(stage, _)| *stage == Stage::Proposal)
            .expect("proposal column");
        assert_eq!(proposal.1.len(), 2);
        let lead_gen = columns
            .iter()
            .find(|(stage, _)| *stage == Stage::LeadGen)
            .expect("lead gen column");
        assert!(lead_gen.1.is_empty());
    }

    #[test]
    fn terminal_stages_never_depart() {
        for target in Stage::ALL {
            assert!(!can_transition(Stage::ClosedWon, target));
            assert!(!can_transition(Stage::ClosedLost, target));
        }
    }

    #[test]
    fn open_stages_move_freely_in_both_directions() {
        assert!(can_transition(Stage::Negotiation, Stage::LeadGen));
        assert!(can_transition(Stage::LeadGen, Stage::Negotiation));
        assert!(can_transition(Stage::Demo, Stage::ClosedLost));
    }

    #[test]
    fn moving_a_closed_deal_is_rejected_even_to_its_own_stage() {
        let won = deal_in(Stage::ClosedWon);
        assert_eq!(plan_move(&won, Stage::Proposal), MovePlan::RejectedTerminal);
        assert_eq!(plan_move(&won, Stage::ClosedWon), MovePlan::RejectedTerminal);
    }

    #[test]
    fn same_stage_drop_is_a_no_op() {
        let open = deal_in(Stage::Demo);
        assert_eq!(plan_move(&open, Stage::Demo), MovePlan::NoOp);
    }

    #[test]
    fn closing_as_won_requires_confirmation() {
        let open = deal_in(Stage::Negotiation);
        assert_eq!(
            plan_move(&open, Stage::ClosedWon),
            MovePlan::NeedsConfirmation
        );
        assert_eq!(plan_move(&open, Stage::Qualification), MovePlan::Apply);
    }

    #[test]
    fn mark_lost_asks_unless_already_closed() {
        assert_eq!(
            plan_mark_lost(&deal_in(Stage::Proposal)),
            MovePlan::NeedsConfirmation
        );
        assert_eq!(
            plan_mark_lost(&deal_in(Stage::ClosedLost)),
            MovePlan::RejectedTerminal
        );
    }
}
