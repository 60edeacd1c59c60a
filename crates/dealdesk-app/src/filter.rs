// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::cmp::Ordering;
use time::Date;

use crate::model::{Deal, Priority, SortDirection, SortKey, Stage};

/// Narrowing criteria for the visible deal list. `None` means "All"
/// for the choice filters and "unbounded" for the date bounds; the
/// default value matches every deal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterParams {
    pub search: String,
    pub assignee: Option<String>,
    pub stage: Option<Stage>,
    pub priority: Option<Priority>,
    pub due_from: Option<Date>,
    pub due_to: Option<Date>,
}

impl FilterParams {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// All conditions AND-combined.
    pub fn matches(&self, deal: &Deal) -> bool {
        let search = self.search.trim().to_lowercase();
        if !search.is_empty() {
            let haystack = format!("{} {}", deal.company, deal.contact_person).to_lowercase();
            if !haystack.contains(&search) {
                return false;
            }
        }

        if let Some(assignee) = &self.assignee
            && !deal.assignees.iter().any(|a| a.name == *assignee)
        {
            return false;
        }

        if let Some(stage) = self.stage
            && deal.stage != stage
        {
            return false;
        }

        if let Some(priority) = self.priority
            && deal.priority != priority
        {
            return false;
        }

        if let Some(from) = self.due_from
            && deal.due_date < from
        {
            return false;
        }

        if let Some(to) = self.due_to
            && deal.due_date > to
        {
            return false;
        }

        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    /// Table semantics: the first sort on a new key starts descending,
    /// sorting the same key again flips direction.
    pub fn cycle(current: Option<Self>, key: SortKey) -> Self {
        match current {
            Some(spec) if spec.key == key => Self {
                key,
                direction: spec.direction.toggled(),
            },
            _ => Self {
                key,
                direction: SortDirection::Desc,
            },
        }
    }
}

fn compare_by_key(left: &Deal, right: &Deal, key: SortKey) -> Ordering {
    match key {
        SortKey::Company => left
            .company
            .to_lowercase()
            .cmp(&right.company.to_lowercase()),
        SortKey::Value => left.value_cents.cmp(&right.value_cents),
        SortKey::Probability => left.probability.cmp(&right.probability),
        SortKey::Stage => left.stage.cmp(&right.stage),
        SortKey::Priority => left.priority.cmp(&right.priority),
        SortKey::DueDate => left.due_date.cmp(&right.due_date),
        SortKey::DaysInStage => left.days_in_stage.cmp(&right.days_in_stage),
    }
}

pub fn filter_deals(deals: &[Deal], params: &FilterParams) -> Vec<Deal> {
    deals
        .iter()
        .filter(|deal| params.matches(deal))
        .cloned()
        .collect()
}

pub fn sort_deals(deals: &mut [Deal], sort: SortSpec) {
    deals.sort_by(|left, right| {
        let ordering = compare_by_key(left, right, sort.key);
        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

/// Filter then sort; the derived view the presentation layer renders.
pub fn apply(deals: &[Deal], params: &FilterParams, sort: SortSpec) -> Vec<Deal> {
    let mut narrowed = filter_deals(deals, params);
    sort_deals(&mut narrowed, sort);
    narrowed
}

#[cfg(test)]
mod tests {
    use super::{FilterParams, SortSpec, apply, filter_deals, sort_deals};
    use crate::ids::DealId;
    use crate::model::{Assignee, Deal, Priority, SortDirection, SortKey, Stage};
    use time::{Date, Month};

    fn date(day: u8) -> Date {
        Date::from_calendar_date(2026, Month::April, day).expect("valid date")
    }

    fn deal(index: usize, company: &str, contact: &str) -> Deal {
        Deal {
            id: DealId::for_demo(index),
            company: company.to_owned(),
            contact_person: contact.to_owned(),
            description: String::new(),
            value_cents: (index as i64 + 1) * 10_000,
            probability: (index as i32 + 1) * 10,
            stage: Stage::ALL[index % Stage::ALL.len()],
            priority: Priority::ALL[index % Priority::ALL.len()],
            assignees: vec![Assignee::named(contact)],
            due_date: date((index as u8 % 28) + 1),
            days_in_stage: index as i32,
            comments: 0,
            attachments: 0,
            created_by: String::new(),
            updated_by: String::new(),
            created_at: None,
            updated_at: None,
        }
    }

    fn roster() -> Vec<Deal> {
        vec![
            deal(0, "Acme Metals", "Dana Reed"),
            deal(1, "Borealis Labs", "Sam Ortiz"),
            deal(2, "Cascade Freight", "Dana Reed"),
            deal(3, "Delta Optics", "Lee Park"),
            deal(4, "acme software", "Robin Cruz"),
        ]
    }

    #[test]
    fn default_params_match_everything() {
        let deals = roster();
        let narrowed = filter_deals(&deals, &FilterParams::default());
        assert_eq!(narrowed, deals);
    }

    #[test]
    fn search_is_case_insensitive_over_company_and_contact() {
        let deals = roster();
        let params = FilterParams {
            search: "ACME".to_owned(),
            ..FilterParams::default()
        };
        let narrowed = filter_deals(&deals, &params);
        assert_eq!(narrowed.len(), 2);

        let params = FilterParams {
            search: "dana".to_owned(),
            ..FilterParams::default()
        };
        assert_eq!(filter_deals(&deals, &params).len(), 2);
    }

    #[test]
    fn assignee_filter_matches_any_listed_name() {
        let deals = roster();
        let params = FilterParams {
            assignee: Some("Dana Reed".to_owned()),
            ..FilterParams::default()
        };
        let narrowed = filter_deals(&deals, &params);
        assert_eq!(narrowed.len(), 2);
        assert!(narrowed.iter().all(|d| d.assignees[0].name == "Dana Reed"));
    }

    #[test]
    fn stage_and_priority_filters_are_exact() {
        let deals = roster();
        let params = FilterParams {
            stage: Some(Stage::LeadGen),
            ..FilterParams::default()
        };
        assert_eq!(filter_deals(&deals, &params).len(), 1);

        let params = FilterParams {
            priority: Some(Priority::Medium),
            ..FilterParams::default()
        };
        let narrowed = filter_deals(&deals, &params);
        assert!(narrowed.iter().all(|d| d.priority == Priority::Medium));
    }

    #[test]
    fn date_range_bounds_are_inclusive_and_independent() {
        let deals = roster();
        let params = FilterParams {
            due_from: Some(date(2)),
            due_to: Some(date(4)),
            ..FilterParams::default()
        };
        let narrowed = filter_deals(&deals, &params);
        assert_eq!(narrowed.len(), 3);
        assert!(
            narrowed
                .iter()
                .all(|d| d.due_date >= date(2) && d.due_date <= date(4))
        );

        let open_ended = FilterParams {
            due_from: Some(date(3)),
            ..FilterParams::default()
        };
        assert_eq!(filter_deals(&deals, &open_ended).len(), 3);
    }

    #[test]
    fn asc_and_desc_are_exact_reverses_without_ties() {
        let deals = roster();
        let mut asc = deals.clone();
        sort_deals(
            &mut asc,
            SortSpec {
                key: SortKey::Value,
                direction: SortDirection::Asc,
            },
        );
        let mut desc = deals;
        sort_deals(
            &mut desc,
            SortSpec {
                key: SortKey::Value,
                direction: SortDirection::Desc,
            },
        );
        desc.reverse();
        assert_eq!(asc, desc);
    }

    #[test]
    fn stage_sort_follows_pipeline_order_not_alphabet() {
        let mut deals = roster();
        sort_deals(
            &mut deals,
            SortSpec {
                key: SortKey::Stage,
                direction: SortDirection::Asc,
            },
        );
        let stages: Vec<Stage> = deals.iter().map(|d| d.stage).collect();
        let mut expected = stages.clone();
        expected.sort();
        assert_eq!(stages, expected);
        assert_eq!(stages[0], Stage::LeadGen);
    }

    #[test]
    fn apply_filters_then_sorts() {
        let deals = roster();
        let params = FilterParams {
            search: "acme".to_owned(),
            ..FilterParams::default()
        };
        let view = apply(
            &deals,
            &params,
            SortSpec {
                key: SortKey::Company,
                direction: SortDirection::Asc,
            },
        );
        let companies: Vec<&str> = view.iter().map(|d| d.company.as_str()).collect();
        assert_eq!(companies, vec!["Acme Metals", "acme software"]);
    }

    #[test]
    fn sort_cycle_starts_desc_then_toggles() {
        let first = SortSpec::cycle(None, SortKey::Value);
        assert_eq!(first.direction, SortDirection::Desc);

        let second = SortSpec::cycle(Some(first), SortKey::Value);
        assert_eq!(second.direction, SortDirection::Asc);

        let switched = SortSpec::cycle(Some(second), SortKey::DueDate);
        assert_eq!(switched.key, SortKey::DueDate);
        assert_eq!(switched.direction, SortDirection::Desc);
    }

    #[test]
    fn empty_input_stays_empty() {
        assert!(filter_deals(&[], &FilterParams::default()).is_empty());
    }
}
