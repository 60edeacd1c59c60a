// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::ids::DealId;

time::serde::format_description!(pub iso_date, Date, "[year]-[month]-[day]");

/// Pipeline stages in board order. The two `Closed*` stages are
/// terminal: a deal that reaches one is never moved again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    LeadGen,
    Qualification,
    Proposal,
    Demo,
    Negotiation,
    ClosedWon,
    ClosedLost,
}

impl Stage {
    pub const ALL: [Self; 7] = [
        Self::LeadGen,
        Self::Qualification,
        Self::Proposal,
        Self::Demo,
        Self::Negotiation,
        Self::ClosedWon,
        Self::ClosedLost,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LeadGen => "lead_gen",
            Self::Qualification => "qualification",
            Self::Proposal => "proposal",
            Self::Demo => "demo",
            Self::Negotiation => "negotiation",
            Self::ClosedWon => "closed_won",
            Self::ClosedLost => "closed_lost",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "lead_gen" => Some(Self::LeadGen),
            "qualification" => Some(Self::Qualification),
            "proposal" => Some(Self::Proposal),
            "demo" => Some(Self::Demo),
            "negotiation" => Some(Self::Negotiation),
            "closed_won" => Some(Self::ClosedWon),
            "closed_lost" => Some(Self::ClosedLost),
            _ => None,
        }
    }

    /// Accepts either the storage form or the display label, any case.
    /// CSV rows arrive in display form ("Lead Gen", "Proposal").
    pub fn parse_loose(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase().replace(' ', "_");
        Self::parse(&normalized)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::LeadGen => "Lead Gen",
            Self::Qualification => "Qualification",
            Self::Proposal => "Proposal",
            Self::Demo => "Demo",
            Self::Negotiation => "Negotiation",
            Self::ClosedWon => "Closed Won",
            Self::ClosedLost => "Closed Lost",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::ClosedWon | Self::ClosedLost)
    }

    /// Stages a newly created lead may start in.
    pub fn open_stages() -> impl Iterator<Item = Self> {
        Self::ALL.into_iter().filter(|stage| !stage.is_terminal())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn parse_loose(value: &str) -> Option<Self> {
        Self::parse(&value.trim().to_ascii_lowercase())
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Lead qualification rating; seeds both priority and probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Hot,
    Warm,
    Cold,
}

impl Rating {
    pub const ALL: [Self; 3] = [Self::Hot, Self::Warm, Self::Cold];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hot => "hot",
            Self::Warm => "warm",
            Self::Cold => "cold",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "hot" => Some(Self::Hot),
            "warm" => Some(Self::Warm),
            "cold" => Some(Self::Cold),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Hot => "Hot",
            Self::Warm => "Warm",
            Self::Cold => "Cold",
        }
    }

    pub const fn priority(self) -> Priority {
        match self {
            Self::Hot => Priority::High,
            Self::Warm => Priority::Medium,
            Self::Cold => Priority::Low,
        }
    }

    pub const fn probability_seed(self) -> i32 {
        match self {
            Self::Hot => 80,
            Self::Warm => 50,
            Self::Cold => 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    pub name: String,
    #[serde(default)]
    pub avatar: String,
}

impl Assignee {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            avatar: String::new(),
        }
    }

    pub fn unassigned() -> Self {
        Self::named("Unassigned")
    }
}

/// A sales opportunity tracked through the pipeline. Persisted as a
/// JSON array of these objects, camelCase keys, `dueDate` as
/// YYYY-MM-DD, audit stamps as RFC 3339.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: DealId,
    pub company: String,
    #[serde(default)]
    pub contact_person: String,
    #[serde(default)]
    pub description: String,
    /// Monetary amount in cents, never negative.
    #[serde(rename = "value")]
    pub value_cents: i64,
    /// Heuristic closing likelihood. Nominally 0-100 but not clamped;
    /// imported data round-trips whatever number it carried.
    #[serde(default)]
    pub probability: i32,
    pub stage: Stage,
    pub priority: Priority,
    #[serde(default)]
    pub assignees: Vec<Assignee>,
    #[serde(with = "iso_date")]
    pub due_date: Date,
    #[serde(default)]
    pub days_in_stage: i32,
    #[serde(default)]
    pub comments: i32,
    #[serde(default)]
    pub attachments: i32,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub updated_by: String,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub created_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub updated_at: Option<OffsetDateTime>,
}

impl Deal {
    pub const fn is_open(&self) -> bool {
        !self.stage.is_terminal()
    }
}

/// Totals for the summary strip above the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineSummary {
    pub open_count: usize,
    pub open_value_cents: i64,
    pub weighted_value_cents: i64,
    pub won_count: usize,
    pub won_value_cents: i64,
    pub lost_count: usize,
}

impl PipelineSummary {
    pub fn from_deals(deals: &[Deal]) -> Self {
        let mut summary = Self::default();
        for deal in deals {
            match deal.stage {
                Stage::ClosedWon => {
                    summary.won_count += 1;
                    summary.won_value_cents += deal.value_cents;
                }
                Stage::ClosedLost => {
                    summary.lost_count += 1;
                }
                _ => {
                    summary.open_count += 1;
                    summary.open_value_cents += deal.value_cents;
                    summary.weighted_value_cents +=
                        deal.value_cents * i64::from(deal.probability) / 100;
                }
            }
        }
        summary
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    Company,
    Value,
    Probability,
    Stage,
    Priority,
    DueDate,
    DaysInStage,
}

impl SortKey {
    pub const ALL: [Self; 7] = [
        Self::Company,
        Self::Value,
        Self::Probability,
        Self::Stage,
        Self::Priority,
        Self::DueDate,
        Self::DaysInStage,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::Value => "value",
            Self::Probability => "probability",
            Self::Stage => "stage",
            Self::Priority => "priority",
            Self::DueDate => "due",
            Self::DaysInStage => "days in stage",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewMode {
    Kanban,
    Table,
}

impl ViewMode {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Kanban => "kanban",
            Self::Table => "table",
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::Kanban => Self::Table,
            Self::Table => Self::Kanban,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "kanban" => Some(Self::Kanban),
            "table" => Some(Self::Table),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Lead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Nav,
    Form(FormKind),
}
