//! Enumerations and field types for task management.
//!
//! This module defines the structured data types used to classify tasks:
//! the three priority lanes of the board and the sort keys for list output.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Priority lane of a task. Doubles as the board column it lives in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[serde(alias = "High")]
    High,
    #[serde(alias = "Medium")]
    Medium,
    #[serde(alias = "Low")]
    Low,
}

impl Priority {
    /// Column order on the board, left to right.
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];
}

/// Available sorting options for task lists.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortKey {
    Due,
    Priority,
    Id,
}
