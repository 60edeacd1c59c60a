// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::ids::DealId;
use crate::model::{AppMode, FormKind, ViewMode};

/// An action parked behind a confirmation. The presentation layer
/// renders the question; `ConfirmPending`/`CancelPending` resolve it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    CloseWon { deal: DealId },
    MarkLost { deal: DealId },
}

impl PendingAction {
    pub fn prompt(&self) -> String {
        match self {
            Self::CloseWon { deal } => format!("close deal {deal} as won?"),
            Self::MarkLost { deal } => format!("mark deal {deal} as lost?"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub mode: AppMode,
    pub view: ViewMode,
    pub status_line: Option<String>,
    pub pending: Option<PendingAction>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: AppMode::Nav,
            view: ViewMode::Kanban,
            status_line: None,
            pending: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    ToggleView,
    OpenForm(FormKind),
    ExitToNav,
    RequestConfirm(PendingAction),
    ConfirmPending,
    CancelPending,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ModeChanged(AppMode),
    ViewChanged(ViewMode),
    ConfirmRequested(PendingAction),
    /// The parked action was accepted; the runtime applies it now.
    ActionConfirmed(PendingAction),
    ActionCanceled(PendingAction),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::ToggleView => {
                self.view = self.view.toggled();
                vec![
                    AppEvent::ViewChanged(self.view),
                    self.set_status(self.view.label()),
                ]
            }
            AppCommand::OpenForm(kind) => {
                self.mode = AppMode::Form(kind);
                vec![AppEvent::ModeChanged(self.mode)]
            }
            AppCommand::ExitToNav => {
                self.mode = AppMode::Nav;
                vec![AppEvent::ModeChanged(self.mode)]
            }
            AppCommand::RequestConfirm(action) => {
                self.pending = Some(action.clone());
                vec![AppEvent::ConfirmRequested(action)]
            }
            AppCommand::ConfirmPending => match self.pending.take() {
                Some(action) => vec![AppEvent::ActionConfirmed(action)],
                None => Vec::new(),
            },
            AppCommand::CancelPending => match self.pending.take() {
                Some(action) => {
                    vec![
                        AppEvent::ActionCanceled(action),
                        self.set_status("canceled"),
                    ]
                }
                None => Vec::new(),
            },
            AppCommand::SetStatus(message) => {
                vec![self.set_status(&message)]
            }
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}
