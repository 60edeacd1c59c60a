// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use dealdesk_app::{Deal, DealId, Priority, Stage};
use std::cell::RefCell;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

pub const APP_NAME: &str = "dealdesk";
pub const DATA_FILE_NAME: &str = "deals.json";

/// Partial update merged into one deal by `Store::update`. Absent
/// fields leave the deal untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DealPatch {
    pub stage: Option<Stage>,
    pub priority: Option<Priority>,
    pub probability: Option<i32>,
    pub days_in_stage: Option<i32>,
    pub updated_by: Option<String>,
}

impl DealPatch {
    /// The patch a stage move writes: the new stage plus a reset
    /// days-in-stage counter.
    pub fn stage_move(target: Stage) -> Self {
        Self {
            stage: Some(target),
            days_in_stage: Some(0),
            ..Self::default()
        }
    }
}

enum Backing {
    File(PathBuf),
    Memory(RefCell<Vec<Deal>>),
}

/// Single owner of the canonical deal list. One JSON array in one
/// file; every mutation rewrites the whole array and returns the
/// updated list. Callers treat `load` output as a read-only snapshot.
pub struct Store {
    backing: Backing,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("create data directory {}", parent.display()))?;
        }
        Ok(Self {
            backing: Backing::File(path.to_path_buf()),
        })
    }

    pub fn open_memory() -> Self {
        Self {
            backing: Backing::Memory(RefCell::new(Vec::new())),
        }
    }

    pub fn data_path(&self) -> Option<&Path> {
        match &self.backing {
            Backing::File(path) => Some(path),
            Backing::Memory(_) => None,
        }
    }

    /// A missing file, an unreadable file, and malformed JSON all read
    /// as an empty pipeline; corruption is never surfaced to callers.
    pub fn load(&self) -> Vec<Deal> {
        match &self.backing {
            Backing::File(path) => {
                let Ok(raw) = fs::read_to_string(path) else {
                    return Vec::new();
                };
                serde_json::from_str(&raw).unwrap_or_default()
            }
            Backing::Memory(deals) => deals.borrow().clone(),
        }
    }

    pub fn save(&self, deals: &[Deal]) -> Result<()> {
        match &self.backing {
            Backing::File(path) => {
                let body = serde_json::to_string_pretty(deals).context("encode deal list")?;
                let temp = temp_path(path);
                fs::write(&temp, body)
                    .with_context(|| format!("write deal list to {}", temp.display()))?;
                fs::rename(&temp, path)
                    .with_context(|| format!("replace deal file {}", path.display()))?;
                Ok(())
            }
            Backing::Memory(current) => {
                *current.borrow_mut() = deals.to_vec();
                Ok(())
            }
        }
    }

    /// Prepends the new deal, stamps its audit fields, persists, and
    /// returns the updated list.
    pub fn create(&self, mut deal: Deal) -> Result<Vec<Deal>> {
        let now = OffsetDateTime::now_utc();
        deal.created_at.get_or_insert(now);
        deal.updated_at = Some(now);

        let mut deals = self.load();
        deals.insert(0, deal);
        self.save(&deals)?;
        Ok(deals)
    }

    /// Merges `patch` into the deal matching `id`; a missing id is a
    /// persisted no-op, not an error.
    pub fn update(&self, id: &DealId, patch: &DealPatch) -> Result<Vec<Deal>> {
        let mut deals = self.load();
        if let Some(deal) = deals.iter_mut().find(|deal| deal.id == *id) {
            if let Some(stage) = patch.stage {
                deal.stage = stage;
            }
            if let Some(priority) = patch.priority {
                deal.priority = priority;
            }
            if let Some(probability) = patch.probability {
                deal.probability = probability;
            }
            if let Some(days_in_stage) = patch.days_in_stage {
                deal.days_in_stage = days_in_stage;
            }
            if let Some(updated_by) = &patch.updated_by {
                deal.updated_by = updated_by.clone();
            }
            deal.updated_at = Some(OffsetDateTime::now_utc());
        }
        self.save(&deals)?;
        Ok(deals)
    }

    /// Unconditionally overwrites the list (replace-mode CSV import).
    pub fn replace(&self, deals: Vec<Deal>) -> Result<Vec<Deal>> {
        self.save(&deals)?;
        Ok(deals)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| DATA_FILE_NAME.into(), ToOwned::to_owned);
    name.push(".tmp");
    path.with_file_name(name)
}

pub fn default_data_path() -> Result<PathBuf> {
    if let Some(path) = env::var_os("DEALDESK_DATA_PATH") {
        return Ok(PathBuf::from(path));
    }

    let data_root = dirs::data_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set DEALDESK_DATA_PATH to the deals file")
    })?;
    Ok(data_root.join(APP_NAME).join(DATA_FILE_NAME))
}

pub fn validate_data_path(path: &str) -> Result<()> {
    if path.contains("://") || path.starts_with("file:") || path.contains('?') {
        bail!("data path {path:?} looks like a URI; use a plain filesystem path");
    }
    Ok(())
}
