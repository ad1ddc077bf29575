#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_match)]
#![allow(clippy::collapsible_else_if)]

pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod services;
pub mod tui;

// Re-export commonly used types
pub use core::{Condition, ConditionId, ConditionTree, Dataset, GroupJoin, GroupedView, Operator, Row};
pub use error::{FilterDeckError, Result};
pub use services::{DataService, FetchEvent, FetchService};
pub use tui::{Action, ActionCategory, App};
