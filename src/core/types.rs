use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::{EnumIter, IntoEnumIterator};
use uuid::Uuid;

/// Unique identifier for a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConditionId(Uuid);

impl ConditionId {
    /// Create a new unique condition ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the ID as an owned string
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for ConditionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConditionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConditionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s).map_err(|e| e.to_string())?))
    }
}

/// Comparison applied by a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    #[default]
    Equals,
    GreaterThan,
    LessThan,
    Contains,
    NotContains,
    Regex,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "EQUALS",
            Self::GreaterThan => "GREATER_THAN",
            Self::LessThan => "LESS_THAN",
            Self::Contains => "CONTAINS",
            Self::NotContains => "NOT_CONTAINS",
            Self::Regex => "REGEX",
        }
    }

    /// Label shown in the condition builder
    pub fn label(&self) -> &'static str {
        match self {
            Self::Equals => "Equals",
            Self::GreaterThan => "Greater Than",
            Self::LessThan => "Less Than",
            Self::Contains => "Contains",
            Self::NotContains => "Not Contains",
            Self::Regex => "Regex",
        }
    }

    /// True for operators that compare numerically
    pub fn is_comparison(&self) -> bool {
        matches!(self, Self::GreaterThan | Self::LessThan)
    }

    /// Next operator in menu order, wrapping around
    pub fn next(&self) -> Self {
        let all: Vec<Operator> = Operator::iter().collect();
        let idx = all.iter().position(|op| op == self).unwrap_or(0);
        all[(idx + 1) % all.len()]
    }

    /// Previous operator in menu order, wrapping around
    pub fn prev(&self) -> Self {
        let all: Vec<Operator> = Operator::iter().collect();
        let idx = all.iter().position(|op| op == self).unwrap_or(0);
        if idx == 0 { all[all.len() - 1] } else { all[idx - 1] }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EQUALS" => Ok(Self::Equals),
            "GREATER_THAN" => Ok(Self::GreaterThan),
            "LESS_THAN" => Ok(Self::LessThan),
            "CONTAINS" => Ok(Self::Contains),
            "NOT_CONTAINS" => Ok(Self::NotContains),
            "REGEX" => Ok(Self::Regex),
            _ => Err(format!("Unknown operator: {}", s)),
        }
    }
}

/// How a group composes with the groups before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupJoin {
    And,
    #[default]
    Or,
}

impl fmt::Display for GroupJoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
        }
    }
}
