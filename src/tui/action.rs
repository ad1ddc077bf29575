use serde::{Deserialize, Serialize};
use std::fmt;

/// All possible actions in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Action {
    // Navigation
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    PageUp,
    PageDown,
    GoToTop,
    GoToBottom,

    // Focus
    NextFocus,
    PrevFocus,

    // Condition editing
    PrevOption,
    NextOption,
    AddOrCondition,
    AddAndGroup,
    DeleteCondition,

    // Data
    Refresh,
    Export,
    ExportJson,
    Copy,

    // View
    ToggleTheme,
    ToggleAbout,

    // Application
    Quit,
    Confirm,
    Cancel,
}

impl Action {
    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Action::MoveUp => "Move selection up",
            Action::MoveDown => "Move selection down",
            Action::MoveLeft => "Previous part / column",
            Action::MoveRight => "Next part / column",
            Action::PageUp => "Previous page",
            Action::PageDown => "Next page",
            Action::GoToTop => "Go to first row",
            Action::GoToBottom => "Go to last row",
            Action::NextFocus => "Focus next pane",
            Action::PrevFocus => "Focus previous pane",
            Action::PrevOption => "Previous column / operator",
            Action::NextOption => "Next column / operator",
            Action::AddOrCondition => "Add OR condition",
            Action::AddAndGroup => "Add AND group",
            Action::DeleteCondition => "Delete condition",
            Action::Refresh => "Fetch the URL again",
            Action::Export => "Export filtered rows as CSV",
            Action::ExportJson => "Export filtered rows as JSON",
            Action::Copy => "Copy row as JSON",
            Action::ToggleTheme => "Toggle dark mode",
            Action::ToggleAbout => "About",
            Action::Quit => "Quit application",
            Action::Confirm => "Confirm / edit",
            Action::Cancel => "Cancel",
        }
    }

    /// Get category for grouping in help screen
    pub fn category(&self) -> ActionCategory {
        match self {
            Action::MoveUp
            | Action::MoveDown
            | Action::MoveLeft
            | Action::MoveRight
            | Action::PageUp
            | Action::PageDown
            | Action::GoToTop
            | Action::GoToBottom
            | Action::NextFocus
            | Action::PrevFocus => ActionCategory::Navigation,

            Action::PrevOption
            | Action::NextOption
            | Action::AddOrCondition
            | Action::AddAndGroup
            | Action::DeleteCondition => ActionCategory::Conditions,

            Action::Refresh | Action::Export | Action::ExportJson | Action::Copy => {
                ActionCategory::Data
            }

            Action::ToggleTheme | Action::ToggleAbout => ActionCategory::View,

            Action::Quit | Action::Confirm | Action::Cancel => ActionCategory::Application,
        }
    }

    /// Get all possible actions (for validation)
    pub fn all() -> Vec<Action> {
        vec![
            Action::MoveUp,
            Action::MoveDown,
            Action::MoveLeft,
            Action::MoveRight,
            Action::PageUp,
            Action::PageDown,
            Action::GoToTop,
            Action::GoToBottom,
            Action::NextFocus,
            Action::PrevFocus,
            Action::PrevOption,
            Action::NextOption,
            Action::AddOrCondition,
            Action::AddAndGroup,
            Action::DeleteCondition,
            Action::Refresh,
            Action::Export,
            Action::ExportJson,
            Action::Copy,
            Action::ToggleTheme,
            Action::ToggleAbout,
            Action::Quit,
            Action::Confirm,
            Action::Cancel,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionCategory {
    Navigation,
    Conditions,
    Data,
    View,
    Application,
}

impl fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionCategory::Navigation => write!(f, "Navigation"),
            ActionCategory::Conditions => write!(f, "Conditions"),
            ActionCategory::Data => write!(f, "Data"),
            ActionCategory::View => write!(f, "View"),
            ActionCategory::Application => write!(f, "Application"),
        }
    }
}
