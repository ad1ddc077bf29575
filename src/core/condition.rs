use crate::core::types::{ConditionId, GroupJoin, Operator};
use serde::{Deserialize, Serialize};

/// A single field/operator/value filter rule
///
/// `is_group_root` and `group_join` mirror the condition's position inside
/// the tree and are rewritten by `ConditionTree` after every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub id: ConditionId,
    pub is_group_root: bool,
    pub field: String,
    pub operator: Operator,
    /// Empty string marks the condition as inert
    pub value: String,
    pub group_join: GroupJoin,
}

impl Condition {
    /// Create a condition with a fresh id, `EQUALS` and an empty value
    pub fn new(field: impl Into<String>, is_group_root: bool, group_join: GroupJoin) -> Self {
        Self {
            id: ConditionId::new(),
            is_group_root,
            field: field.into(),
            operator: Operator::Equals,
            value: String::new(),
            group_join,
        }
    }

    /// Seed condition for a freshly loaded column set
    pub fn seed(field: impl Into<String>) -> Self {
        Self::new(field, true, GroupJoin::Or)
    }

    pub fn with_operator(mut self, operator: Operator) -> Self {
        self.operator = operator;
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    /// An inert condition matches every row
    pub fn is_inert(&self) -> bool {
        self.value.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_defaults() {
        let c = Condition::seed("Name");
        assert!(c.is_group_root);
        assert_eq!(c.field, "Name");
        assert_eq!(c.operator, Operator::Equals);
        assert_eq!(c.group_join, GroupJoin::Or);
        assert!(c.is_inert());
    }

    #[test]
    fn test_builders_keep_identity() {
        let c = Condition::seed("Name");
        let id = c.id;
        let c = c.with_operator(Operator::Regex).with_value("^A").with_field("City");
        assert_eq!(c.id, id);
        assert_eq!(c.operator, Operator::Regex);
        assert_eq!(c.value, "^A");
        assert_eq!(c.field, "City");
        assert!(!c.is_inert());
    }

    #[test]
    fn test_serialization_uses_camel_case() {
        let c = Condition::seed("Age").with_operator(Operator::GreaterThan).with_value("3");
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["isGroupRoot"], true);
        assert_eq!(json["operator"], "GREATER_THAN");
        assert_eq!(json["groupJoin"], "OR");
    }
}
