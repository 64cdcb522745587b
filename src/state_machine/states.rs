use serde::{Deserialize, Serialize};
use std::fmt;

/// Item status definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Initial state when an item is created
    Pending,
    /// Item is being worked on
    InProgress,
    /// Item is done
    Completed,
}

impl ItemStatus {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Check if an item in this state satisfies dependencies of other items
    pub fn satisfies_dependencies(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Whether moving into this state requires every dependency to be completed
    pub fn requires_dependencies(&self) -> bool {
        matches!(self, Self::InProgress | Self::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("Invalid item status: {s}")),
        }
    }
}

/// List status definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListStatus {
    /// List is open for work
    Active,
    /// All work in the list is done
    Completed,
    /// List is retired from view
    Archived,
}

impl ListStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Item status that items of a list take when a status change cascades to them.
    /// Re-activating a list leaves its items untouched.
    pub fn cascaded_item_status(&self) -> Option<ItemStatus> {
        match self {
            Self::Active => None,
            Self::Completed | Self::Archived => Some(ItemStatus::Completed),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for ListStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ListStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "archived" => Ok(Self::Archived),
            _ => Err(format!("Invalid list status: {s}")),
        }
    }
}

/// Default state for new items
impl Default for ItemStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// Default state for new lists
impl Default for ListStatus {
    fn default() -> Self {
        Self::Active
    }
}
