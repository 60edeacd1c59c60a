// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use time::OffsetDateTime;

use crate::ids::DealId;
use crate::model::{Assignee, Deal, Priority, Stage};
use crate::validation::{format_plain_cents, parse_required_cents};

pub const CSV_HEADER: [&str; 6] = [
    "Company",
    "Description",
    "Value",
    "Stage",
    "Priority",
    "Probability",
];

/// How parsed rows land in the store: prepended to the existing list,
/// or in place of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    Append,
    Replace,
}

pub fn export_file_name(now: OffsetDateTime) -> String {
    format!("export_{}.csv", unix_ms(now))
}

/// Serializes the currently filtered list in its current order.
/// Refuses an empty list so no file gets produced for it.
pub fn export_csv(deals: &[Deal]) -> Result<String> {
    if deals.is_empty() {
        bail!("no deals match the current filter -- nothing to export");
    }

    let mut out = CSV_HEADER.join(",");
    out.push('\n');
    for deal in deals {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            quote(&deal.company),
            quote(&deal.description),
            format_plain_cents(deal.value_cents),
            deal.stage.label(),
            deal.priority.as_str(),
            deal.probability,
        ));
    }
    Ok(out)
}

/// Parses exporter-shaped CSV text into fresh deals. Rows split on
/// bare commas with simple quote-stripping (embedded commas are not
/// supported), short rows are skipped, numeric fields fall back to 0.
/// A header mismatch or a file with zero usable rows aborts the whole
/// import with no partial result.
pub fn parse_csv(text: &str, now: OffsetDateTime) -> Result<Vec<Deal>> {
    let mut lines = text.lines().enumerate();
    let Some((_, header)) = lines.next() else {
        bail!("CSV file is empty; expected header {}", CSV_HEADER.join(","));
    };
    validate_header(header)?;

    let stamp = unix_ms(now);
    let today = now.date();
    let mut deals = Vec::new();
    for (line_index, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<String> = line.split(',').map(strip_quotes).collect();
        if fields.len() < CSV_HEADER.len() {
            continue;
        }

        deals.push(Deal {
            id: DealId::for_import(stamp, line_index),
            company: fields[0].clone(),
            contact_person: String::new(),
            description: fields[1].clone(),
            value_cents: parse_required_cents(&fields[2]).unwrap_or(0),
            stage: Stage::parse_loose(&fields[3]).unwrap_or(Stage::LeadGen),
            priority: Priority::parse_loose(&fields[4]).unwrap_or(Priority::Medium),
            probability: fields[5].trim().parse().unwrap_or(0),
            assignees: vec![Assignee::unassigned()],
            due_date: today,
            days_in_stage: 0,
            comments: 0,
            attachments: 0,
            created_by: String::new(),
            updated_by: String::new(),
            created_at: Some(now),
            updated_at: Some(now),
        });
    }

    if deals.is_empty() {
        bail!("no importable rows found; check the file against the export format");
    }
    Ok(deals)
}

fn validate_header(line: &str) -> Result<()> {
    let columns: Vec<String> = line.split(',').map(strip_quotes).collect();
    let matches = columns.len() == CSV_HEADER.len()
        && columns
            .iter()
            .zip(CSV_HEADER)
            .all(|(got, want)| got.trim().eq_ignore_ascii_case(want));
    if !matches {
        bail!(
            "CSV header mismatch; expected {} -- got {:?}",
            CSV_HEADER.join(","),
            line
        );
    }
    Ok(())
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn strip_quotes(field: &str) -> String {
    let trimmed = field.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        trimmed[1..trimmed.len() - 1].replace("\"\"", "\"")
    } else {
        trimmed.to_owned()
    }
}

fn unix_ms(now: OffsetDateTime) -> i64 {
    (now.unix_timestamp_nanos() / 1_000_000) as i64
}
