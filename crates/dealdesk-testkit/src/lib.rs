// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use dealdesk_app::{Assignee, Deal, DealId, Priority, Stage};
use std::path::PathBuf;
use time::{Duration, OffsetDateTime};

const COMPANY_ADJECTIVES: [&str; 12] = [
    "Apex", "Borealis", "Cascade", "Delta", "Evergreen", "Fathom", "Granite", "Harbor", "Ion",
    "Juniper", "Keystone", "Lumen",
];

const COMPANY_NOUNS: [&str; 10] = [
    "Metals",
    "Labs",
    "Freight",
    "Optics",
    "Systems",
    "Foods",
    "Robotics",
    "Media",
    "Logistics",
    "Analytics",
];

const COMPANY_SUFFIXES: [&str; 5] = ["Inc", "LLC", "Group", "Co", "Partners"];

const FIRST_NAMES: [&str; 16] = [
    "Avery", "Jordan", "Taylor", "Riley", "Morgan", "Casey", "Alex", "Quinn", "Parker", "Drew",
    "Kai", "Elliot", "Robin", "Cameron", "Hayden", "Rowan",
];

const LAST_NAMES: [&str; 18] = [
    "Walker", "Martin", "Hill", "Evans", "Lopez", "Gray", "Ward", "Young", "Diaz", "Reed",
    "Campbell", "Turner", "Flores", "Bennett", "Price", "Morris", "Foster", "Brooks",
];

const DEAL_TOPICS: [&str; 8] = [
    "platform renewal",
    "pilot rollout",
    "expansion seats",
    "annual license",
    "integration project",
    "support upgrade",
    "multi-year contract",
    "replacement bid",
];

const DEMO_DEAL_COUNT: usize = 40;

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Deterministic deal generator: the same seed always produces the
/// same pipeline, so demo mode and tests are reproducible.
#[derive(Debug, Clone)]
pub struct DealFaker {
    rng: DeterministicRng,
    now: OffsetDateTime,
    sequence: usize,
}

impl DealFaker {
    pub fn new(seed: u64, now: OffsetDateTime) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            now,
            sequence: 0,
        }
    }

    pub fn deal(&mut self) -> Deal {
        let stage = Stage::ALL[self.rng.int_n(Stage::ALL.len())];
        self.deal_in(stage)
    }

    pub fn deal_in(&mut self, stage: Stage) -> Deal {
        let index = self.sequence;
        self.sequence += 1;

        let company = format!(
            "{} {} {}",
            self.pick(&COMPANY_ADJECTIVES),
            self.pick(&COMPANY_NOUNS),
            self.pick(&COMPANY_SUFFIXES),
        );
        let contact = self.person();

        let probability = match stage {
            Stage::ClosedWon => 100,
            Stage::ClosedLost => 0,
            _ => (self.rng.int_n(9) as i32 + 1) * 10,
        };
        let priority = Priority::ALL[self.rng.int_n(Priority::ALL.len())];
        let value_cents = self.int_range_i64(500_000, 25_000_000);

        let mut assignees = vec![Assignee::named(contact.clone())];
        if self.rng.int_n(3) == 0 {
            assignees.push(Assignee::named(self.person()));
        }

        let due_offset = self.int_range_i64(-20, 90);
        let days_in_stage = if stage.is_terminal() {
            0
        } else {
            self.rng.int_n(45) as i32
        };

        Deal {
            id: DealId::for_demo(index),
            company: company.clone(),
            contact_person: contact,
            description: format!("{company} {}", self.pick(&DEAL_TOPICS)),
            value_cents,
            probability,
            stage,
            priority,
            assignees,
            due_date: (self.now + Duration::days(due_offset)).date(),
            days_in_stage,
            comments: self.rng.int_n(8) as i32,
            attachments: self.rng.int_n(4) as i32,
            created_by: "demo seed".to_owned(),
            updated_by: String::new(),
            created_at: Some(self.now - Duration::days(days_in_stage.into())),
            updated_at: Some(self.now),
        }
    }

    fn person(&mut self) -> String {
        format!("{} {}", self.pick(&FIRST_NAMES), self.pick(&LAST_NAMES))
    }

    fn pick<'a>(&mut self, values: &[&'a str]) -> &'a str {
        values[self.rng.int_n(values.len())]
    }

    fn int_range_i64(&mut self, low: i64, high: i64) -> i64 {
        low + self.rng.int_n((high - low + 1) as usize) as i64
    }
}

/// The pipeline `--demo` boots with: every stage populated, the rest
/// spread by the faker.
pub fn demo_deals(now: OffsetDateTime) -> Vec<Deal> {
    let mut faker = DealFaker::new(20_260_409, now);
    let mut deals: Vec<Deal> = Stage::ALL
        .into_iter()
        .map(|stage| faker.deal_in(stage))
        .collect();
    while deals.len() < DEMO_DEAL_COUNT {
        deals.push(faker.deal());
    }
    deals
}

/// Scratch location for store tests.
pub fn temp_data_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("deals.json");
    Ok((dir, path))
}

#[cfg(test)]
mod tests {
    use super::{DealFaker, demo_deals};
    use dealdesk_app::Stage;
    use time::macros::datetime;

    #[test]
    fn same_seed_same_pipeline() {
        let now = datetime!(2026-04-09 12:00 UTC);
        let mut left = DealFaker::new(7, now);
        let mut right = DealFaker::new(7, now);
        for _ in 0..10 {
            assert_eq!(left.deal(), right.deal());
        }
    }

    #[test]
    fn demo_pipeline_covers_every_stage() {
        let deals = demo_deals(datetime!(2026-04-09 12:00 UTC));
        assert_eq!(deals.len(), 40);
        for stage in Stage::ALL {
            assert!(
                deals.iter().any(|deal| deal.stage == stage),
                "stage {} missing from demo data",
                stage.label()
            );
        }
    }

    #[test]
    fn demo_ids_are_unique() {
        let deals = demo_deals(datetime!(2026-04-09 12:00 UTC));
        let mut ids: Vec<&str> = deals.iter().map(|deal| deal.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), deals.len());
    }

    #[test]
    fn closed_deals_carry_settled_probabilities() {
        let deals = demo_deals(datetime!(2026-04-09 12:00 UTC));
        for deal in deals {
            match deal.stage {
                Stage::ClosedWon => assert_eq!(deal.probability, 100),
                Stage::ClosedLost => assert_eq!(deal.probability, 0),
                _ => assert!((10..=90).contains(&deal.probability)),
            }
        }
    }
}
