//! Trigger expression trees.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::Id;
use crate::error::{Issue, RecordKind};
use crate::schema::{Condition, FieldPath, Fields, Schema};

/// A node in a trigger expression tree.
///
/// `AND` and `OR` are strictly binary and `NOT` has exactly one child.
/// Children are owned, so a tree can never contain a cycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerNode {
    /// Leaf delegating to the condition evaluator.
    Condition { condition: Condition },

    Not { child: Box<TriggerNode> },

    True,

    False,

    And {
        left: Box<TriggerNode>,
        right: Box<TriggerNode>,
    },

    Or {
        left: Box<TriggerNode>,
        right: Box<TriggerNode>,
    },
}

impl TriggerNode {
    pub const NAMES: &'static [&'static str] = &["CONDITION", "NOT", "TRUE", "FALSE", "AND", "OR"];

    /// Deepest tree admitted by validation and accepted by the evaluator.
    ///
    /// Each node is one JSON object deeper inside a snapshot, and snapshots
    /// must stay under serde_json's 128-level nesting limit to reload.
    pub const MAX_DEPTH: usize = 64;

    /// Create a condition leaf.
    pub fn condition(condition: Condition) -> Self {
        Self::Condition { condition }
    }

    /// Combine with AND. `self` is evaluated first.
    #[must_use]
    pub fn and(self, other: TriggerNode) -> Self {
        Self::And {
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    /// Combine with OR. `self` is evaluated first.
    #[must_use]
    pub fn or(self, other: TriggerNode) -> Self {
        Self::Or {
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    /// Negate this node.
    #[must_use]
    pub fn negate(self) -> Self {
        Self::Not { child: Box::new(self) }
    }

    /// Wire name of this node's `type`.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            TriggerNode::Condition { .. } => "CONDITION",
            TriggerNode::Not { .. } => "NOT",
            TriggerNode::True => "TRUE",
            TriggerNode::False => "FALSE",
            TriggerNode::And { .. } => "AND",
            TriggerNode::Or { .. } => "OR",
        }
    }

    /// Number of nodes on the longest root-to-leaf path.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1)];
        while let Some((node, level)) = stack.pop() {
            deepest = deepest.max(level);
            match node {
                TriggerNode::Not { child } => stack.push((child.as_ref(), level + 1)),
                TriggerNode::And { left, right } | TriggerNode::Or { left, right } => {
                    stack.push((right.as_ref(), level + 1));
                    stack.push((left.as_ref(), level + 1));
                }
                TriggerNode::Condition { .. } | TriggerNode::True | TriggerNode::False => {}
            }
        }
        deepest
    }

    fn shape_at(value: &Value, at: &FieldPath, issues: &mut Vec<Issue>, level: usize) {
        if level > Self::MAX_DEPTH {
            at.issue(issues, too_deep());
            return;
        }
        let mut fields = Fields::of(value, at, issues);
        if !fields.is_object() {
            return;
        }
        let Some(kind) = fields.one_of("type", Self::NAMES) else {
            return;
        };
        let children: &[&str] = match kind {
            "NOT" => &["child"],
            "AND" | "OR" => &["left", "right"],
            "CONDITION" => {
                if let Some(condition) = fields.nested("condition") {
                    let path = fields.path("condition");
                    Condition::shape(condition, &path, fields.issues());
                }
                &[]
            }
            _ => &[],
        };
        for name in children {
            if let Some(child) = fields.nested(name) {
                let path = fields.path(name);
                Self::shape_at(child, &path, fields.issues(), level + 1);
            }
        }
    }

    fn check_at(&self, at: &FieldPath, issues: &mut Vec<Issue>, level: usize) {
        if level > Self::MAX_DEPTH {
            at.issue(issues, too_deep());
            return;
        }
        match self {
            TriggerNode::Condition { condition } => condition.check(&at.field("condition"), issues),
            TriggerNode::Not { child } => child.check_at(&at.field("child"), issues, level + 1),
            TriggerNode::And { left, right } | TriggerNode::Or { left, right } => {
                left.check_at(&at.field("left"), issues, level + 1);
                right.check_at(&at.field("right"), issues, level + 1);
            }
            TriggerNode::True | TriggerNode::False => {}
        }
    }

    /// Condition leaves, left to right.
    #[must_use]
    pub fn conditions(&self) -> Vec<&Condition> {
        let mut found = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                TriggerNode::Condition { condition } => found.push(condition),
                TriggerNode::Not { child } => stack.push(child),
                TriggerNode::And { left, right } | TriggerNode::Or { left, right } => {
                    stack.push(right);
                    stack.push(left);
                }
                TriggerNode::True | TriggerNode::False => {}
            }
        }
        found
    }
}

impl Schema for TriggerNode {
    const KIND: RecordKind = RecordKind::TriggerNode;

    fn shape(value: &Value, at: &FieldPath, issues: &mut Vec<Issue>) {
        Self::shape_at(value, at, issues, 1);
    }

    fn check(&self, at: &FieldPath, issues: &mut Vec<Issue>) {
        self.check_at(at, issues, 1);
    }
}

fn too_deep() -> String {
    format!("trigger tree is nested deeper than {} levels", TriggerNode::MAX_DEPTH)
}

/// A named trigger wrapping one expression tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    pub uuid: Id,
    pub owner_uuid: Id,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub root: TriggerNode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Trigger {
    pub fn new(uuid: impl Into<Id>, owner: impl Into<Id>, name: impl Into<String>, root: TriggerNode) -> Self {
        Self {
            uuid: uuid.into(),
            owner_uuid: owner.into(),
            name: name.into(),
            description: None,
            root,
            comment: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Schema for Trigger {
    const KIND: RecordKind = RecordKind::Trigger;

    fn shape(value: &Value, at: &FieldPath, issues: &mut Vec<Issue>) {
        let mut fields = Fields::of(value, at, issues);
        if !fields.is_object() {
            return;
        }
        fields
            .id("uuid")
            .id("ownerUuid")
            .string("name")
            .opt_string("description")
            .opt_string("comment");
        if let Some(root) = fields.nested("root") {
            let path = fields.path("root");
            TriggerNode::shape(root, &path, fields.issues());
        }
    }

    fn check(&self, at: &FieldPath, issues: &mut Vec<Issue>) {
        self.root.check(&at.field("root"), issues);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CompareOp;
    use serde_json::json;

    fn leaf(id: &str) -> Condition {
        Condition::new(id, id, "skill-1", "char-001")
            .on_attribute("hp")
            .compare(CompareOp::Gt, 0)
    }

    #[test]
    fn test_parse_tree() {
        let trigger = Trigger::parse(&json!({
            "uuid": "trig-1",
            "ownerUuid": "skill-1",
            "name": "Desperation",
            "root": {
                "type": "AND",
                "left": {
                    "type": "CONDITION",
                    "condition": {
                        "id": "c1",
                        "name": "Low HP",
                        "ownerUuid": "skill-1",
                        "targetUuid": "char-001",
                        "attributeId": "hp",
                        "op": "lt_percent",
                        "value": 0.3
                    }
                },
                "right": { "type": "NOT", "child": { "type": "FALSE" } }
            }
        }))
        .unwrap();

        assert_eq!(trigger.root.depth(), 3);
        assert_eq!(trigger.root.conditions().len(), 1);
        assert_eq!(trigger.root.type_name(), "AND");
    }

    #[test]
    fn test_unknown_type_is_structural_error() {
        let err = TriggerNode::parse(&json!({
            "type": "AND",
            "left": { "type": "TRUE" },
            "right": { "type": "XOR", "left": { "type": "TRUE" } }
        }))
        .unwrap_err();

        assert_eq!(err.paths().collect::<Vec<_>>(), vec!["right.type"]);
        assert!(serde_json::from_value::<TriggerNode>(json!({ "type": "MAYBE" })).is_err());
    }

    #[test]
    fn test_nested_paths() {
        let err = Trigger::parse(&json!({
            "uuid": "t",
            "ownerUuid": "s",
            "name": "T",
            "root": {
                "type": "OR",
                "left": {
                    "type": "CONDITION",
                    "condition": {
                        "id": "c",
                        "name": "C",
                        "ownerUuid": "s",
                        "targetUuid": "e",
                        "op": "above"
                    }
                }
            }
        }))
        .unwrap_err();

        assert_eq!(err.kind, RecordKind::Trigger);
        assert_eq!(
            err.paths().collect::<Vec<_>>(),
            vec!["root.left.condition.op", "root.right"]
        );
    }

    #[test]
    fn test_cross_field_rules_run_on_leaves() {
        let bad = Condition::new("c", "C", "s", "e")
            .on_attribute("hp")
            .compare(CompareOp::LtPercent, 30);
        let tree = TriggerNode::True.and(TriggerNode::condition(bad).negate());

        let err = tree.validate().unwrap_err();
        let paths: Vec<_> = err.paths().collect();
        assert_eq!(paths, vec!["right.child.condition.value"]);
    }

    fn chain(levels: usize) -> TriggerNode {
        (1..levels).fold(TriggerNode::True, |node, _| node.negate())
    }

    #[test]
    fn test_depth_limit() {
        let deepest = chain(TriggerNode::MAX_DEPTH);
        assert_eq!(deepest.depth(), TriggerNode::MAX_DEPTH);
        assert!(deepest.validate().is_ok());

        let err = chain(TriggerNode::MAX_DEPTH + 1).validate().unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert!(err.issues[0].message.contains("deeper than 64"));
        assert_eq!(err.issues[0].path.matches("child").count(), TriggerNode::MAX_DEPTH);
    }

    #[test]
    fn test_depth_limit_on_raw_json() {
        let raw = serde_json::to_value(chain(TriggerNode::MAX_DEPTH + 1)).unwrap();
        let err = TriggerNode::parse(&raw).unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert!(err.issues[0].message.contains("nested deeper"));

        let raw = serde_json::to_value(chain(TriggerNode::MAX_DEPTH)).unwrap();
        assert!(TriggerNode::parse(&raw).is_ok());
    }

    #[test]
    fn test_conditions_in_order() {
        let tree = TriggerNode::condition(leaf("a"))
            .or(TriggerNode::condition(leaf("b")).and(TriggerNode::condition(leaf("c")).negate()));
        let ids: Vec<_> = tree.conditions().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_serialized_shape() {
        let tree = TriggerNode::True.or(TriggerNode::False.negate());
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(
            json,
            json!({
                "type": "OR",
                "left": { "type": "TRUE" },
                "right": { "type": "NOT", "child": { "type": "FALSE" } }
            })
        );
        assert_eq!(serde_json::from_value::<TriggerNode>(json).unwrap(), tree);
    }
}
