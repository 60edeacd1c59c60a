// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use time::{Duration, OffsetDateTime};

use crate::ids::DealId;
use crate::model::{Assignee, Deal, Rating, Stage};

const DEFAULT_DUE_IN_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadKind {
    Company,
    Individual,
}

impl LeadKind {
    pub const ALL: [Self; 2] = [Self::Company, Self::Individual];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::Individual => "individual",
        }
    }
}

/// Input collected by the lead-creation form. Only the name field
/// matching `kind` is required; the other is ignored on submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadFormInput {
    pub kind: LeadKind,
    pub company_name: String,
    pub individual_name: String,
    pub contact_person: String,
    pub phone: String,
    pub email: String,
    pub budget_cents: i64,
    pub target_stage: Stage,
    pub rating: Rating,
    pub tags: Vec<String>,
    pub notes: String,
}

impl LeadFormInput {
    pub fn blank() -> Self {
        Self {
            kind: LeadKind::Company,
            company_name: String::new(),
            individual_name: String::new(),
            contact_person: String::new(),
            phone: String::new(),
            email: String::new(),
            budget_cents: 0,
            target_stage: Stage::LeadGen,
            rating: Rating::Warm,
            tags: Vec::new(),
            notes: String::new(),
        }
    }

    pub fn display_name(&self) -> &str {
        match self.kind {
            LeadKind::Company => &self.company_name,
            LeadKind::Individual => &self.individual_name,
        }
    }

    /// Checks run in field order; only the first failure surfaces.
    pub fn validate(&self) -> Result<()> {
        match self.kind {
            LeadKind::Company => {
                if self.company_name.trim().is_empty() {
                    bail!("company name is required -- enter a name and retry");
                }
            }
            LeadKind::Individual => {
                if self.individual_name.trim().is_empty() {
                    bail!("individual name is required -- enter a name and retry");
                }
            }
        }
        if !phone_is_valid(&self.phone) {
            bail!("phone looks invalid -- use digits, spaces, and ()+-. only");
        }
        if !email_is_valid(&self.email) {
            bail!("email looks invalid -- use the name@domain.tld form");
        }
        if self.budget_cents <= 0 {
            bail!("budget must be positive");
        }
        if self.target_stage.is_terminal() {
            bail!("new leads cannot start in a closed stage");
        }
        Ok(())
    }

    /// Maps the validated form into a fresh deal. Rating drives both
    /// priority and the probability seed.
    pub fn into_deal(&self, id: DealId, now: OffsetDateTime) -> Deal {
        let (company, contact_person) = match self.kind {
            LeadKind::Company => (self.company_name.clone(), self.contact_person.clone()),
            LeadKind::Individual => (self.individual_name.clone(), self.individual_name.clone()),
        };

        let mut description = self.notes.trim().to_owned();
        let tags: Vec<&str> = self
            .tags
            .iter()
            .map(|tag| tag.trim())
            .filter(|tag| !tag.is_empty())
            .collect();
        if !tags.is_empty() {
            if !description.is_empty() {
                description.push('\n');
            }
            description.push_str("tags: ");
            description.push_str(&tags.join(", "));
        }

        Deal {
            id,
            company,
            contact_person,
            description,
            value_cents: self.budget_cents,
            probability: self.rating.probability_seed(),
            stage: self.target_stage,
            priority: self.rating.priority(),
            assignees: vec![Assignee::unassigned()],
            due_date: (now + Duration::days(DEFAULT_DUE_IN_DAYS)).date(),
            days_in_stage: 0,
            comments: 0,
            attachments: 0,
            created_by: "lead form".to_owned(),
            updated_by: String::new(),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

fn phone_is_valid(phone: &str) -> bool {
    let trimmed = phone.trim();
    let digits = trimmed.chars().filter(char::is_ascii_digit).count();
    digits >= 7
        && trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || " ()+-.".contains(c))
}

fn email_is_valid(email: &str) -> bool {
    let trimmed = email.trim();
    if trimmed.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = trimmed.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.split('.').count() >= 2
        && domain.split('.').all(|part| !part.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{LeadFormInput, LeadKind};
    use crate::ids::DealId;
    use crate::model::{Priority, Rating, Stage};
    use time::macros::datetime;

    fn valid_company_lead() -> LeadFormInput {
        LeadFormInput {
            kind: LeadKind::Company,
            company_name: "Acme Metals".to_owned(),
            individual_name: String::new(),
            contact_person: "Dana Reed".to_owned(),
            phone: "(512) 555-0134".to_owned(),
            email: "dana@acmemetals.com".to_owned(),
            budget_cents: 2_500_000,
            target_stage: Stage::Qualification,
            rating: Rating::Hot,
            tags: vec!["manufacturing".to_owned(), "q2".to_owned()],
            notes: "Met at the trade show".to_owned(),
        }
    }

    #[test]
    fn valid_lead_passes() {
        assert!(valid_company_lead().validate().is_ok());
    }

    #[test]
    fn first_error_wins() {
        let mut lead = valid_company_lead();
        lead.company_name = String::new();
        lead.email = "broken".to_owned();
        let error = lead.validate().expect_err("empty name should fail");
        assert!(error.to_string().contains("company name is required"));
    }

    #[test]
    fn individual_kind_requires_the_individual_name() {
        let mut lead = valid_company_lead();
        lead.kind = LeadKind::Individual;
        assert!(lead.validate().is_err());

        lead.individual_name = "Sam Ortiz".to_owned();
        assert!(lead.validate().is_ok());
    }

    #[test]
    fn phone_and_email_patterns_are_checked() {
        let mut lead = valid_company_lead();
        lead.phone = "call me".to_owned();
        assert!(lead.validate().is_err());

        let mut lead = valid_company_lead();
        lead.phone = "555-01".to_owned();
        assert!(lead.validate().is_err(), "too few digits");

        let mut lead = valid_company_lead();
        lead.email = "dana@nodomain".to_owned();
        assert!(lead.validate().is_err());
    }

    #[test]
    fn budget_must_be_positive() {
        let mut lead = valid_company_lead();
        lead.budget_cents = 0;
        let error = lead.validate().expect_err("zero budget should fail");
        assert!(error.to_string().contains("budget must be positive"));
    }

    #[test]
    fn closed_target_stage_is_rejected() {
        let mut lead = valid_company_lead();
        lead.target_stage = Stage::ClosedWon;
        assert!(lead.validate().is_err());
    }

    #[test]
    fn rating_maps_to_priority_and_probability() {
        let now = datetime!(2026-04-09 09:00 UTC);
        let lead = valid_company_lead();
        let deal = lead.into_deal(DealId::for_lead(1), now);
        assert_eq!(deal.priority, Priority::High);
        assert_eq!(deal.probability, 80);
        assert_eq!(deal.value_cents, 2_500_000);
        assert_eq!(deal.stage, Stage::Qualification);
        assert_eq!(deal.due_date.to_string(), "2026-05-09");
        assert_eq!(deal.assignees[0].name, "Unassigned");
        assert_eq!(deal.days_in_stage, 0);
    }

    #[test]
    fn tags_land_in_the_description_tail() {
        let now = datetime!(2026-04-09 09:00 UTC);
        let deal = valid_company_lead().into_deal(DealId::for_lead(1), now);
        assert!(deal.description.starts_with("Met at the trade show"));
        assert!(deal.description.ends_with("tags: manufacturing, q2"));
    }

    #[test]
    fn individual_lead_uses_the_person_for_both_names() {
        let now = datetime!(2026-04-09 09:00 UTC);
        let mut lead = valid_company_lead();
        lead.kind = LeadKind::Individual;
        lead.individual_name = "Sam Ortiz".to_owned();
        let deal = lead.into_deal(DealId::for_lead(2), now);
        assert_eq!(deal.company, "Sam Ortiz");
        assert_eq!(deal.contact_person, "Sam Ortiz");
    }
}
