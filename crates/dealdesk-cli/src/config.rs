// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use dealdesk_app::ViewMode;
use dealdesk_app::paging::DEFAULT_PAGE_SIZE;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_VERSION: i64 = 1;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub ui: Ui,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            storage: Storage::default(),
            ui: Ui::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Storage {
    pub data_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub view: Option<String>,
    pub page_size: Option<usize>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            view: Some(ViewMode::Kanban.label().to_owned()),
            page_size: Some(DEFAULT_PAGE_SIZE),
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("DEALDESK_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set DEALDESK_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(dealdesk_store::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and move values under [storage] and [ui]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(data_path) = &self.storage.data_path {
            dealdesk_store::validate_data_path(data_path)?;
        }

        if let Some(view) = &self.ui.view
            && ViewMode::parse(view).is_none()
        {
            bail!(
                "ui.view in {} must be \"kanban\" or \"table\", got {view:?}",
                path.display()
            );
        }

        if let Some(page_size) = self.ui.page_size
            && page_size == 0
        {
            bail!("ui.page_size in {} must be positive", path.display());
        }

        Ok(())
    }

    pub fn data_path(&self) -> Result<PathBuf> {
        match &self.storage.data_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => dealdesk_store::default_data_path(),
        }
    }

    pub fn view(&self) -> ViewMode {
        self.ui
            .view
            .as_deref()
            .and_then(ViewMode::parse)
            .unwrap_or(ViewMode::Kanban)
    }

    pub fn page_size(&self) -> usize {
        self.ui.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# dealdesk config\n# Place this file at: {}\n\nversion = 1\n\n[storage]\n# Optional. Default is platform data dir (for example ~/.local/share/dealdesk/deals.json)\n# data_path = \"/absolute/path/to/deals.json\"\n\n[ui]\nview = \"kanban\"\npage_size = {}\n",
            path.display(),
            DEFAULT_PAGE_SIZE,
        )
    }
}
