//! On-disk rule document shape.
//!
//! This is a compatibility surface: an independent companion agent embedded
//! in the target process parses these files, applies the described faults,
//! and self-reverts expired units. Field names and the unit ordering must
//! stay stable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fault-kind discriminator for a single rule unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleFault {
    /// Throw/raise at the selected site; payload is the code to execute.
    Exception,
    /// Sleep before the selected site; payload is the delay expression.
    Delay,
    /// Substitute the return value; payload is the replacement expression.
    ValueOverride,
}

/// One per-unit rule: a target selector plus the templated side effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleUnit {
    /// Target selector, e.g. "com.test.Client@sayHello".
    pub selector: String,
    pub fault: RuleFault,
    /// Templated payload the companion executes or substitutes.
    pub content: String,
    /// Line hint inside the selected method; 0 means first match.
    #[serde(default)]
    pub line_num: u32,
    /// Absolute self-expiry. Omitted (never null) when the experiment has
    /// no timeout: the unit then only reverts on explicit recover.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_at: Option<DateTime<Utc>>,
}

/// Ordered list of rule units for one (container, process, fault family) key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RuleDocument {
    pub rules: Vec<RuleUnit>,
}

impl RuleDocument {
    pub fn new(rules: Vec<RuleUnit>) -> Self {
        Self { rules }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_expiry_is_omitted_from_json() {
        let doc = RuleDocument::new(vec![RuleUnit {
            selector: "com.test.Client@sayHello".into(),
            fault: RuleFault::Exception,
            content: "throw new Exception(\"boom\");".into(),
            line_num: 0,
            expire_at: None,
        }]);
        let json = serde_json::to_string(&doc).unwrap();
        assert!(!json.contains("expire_at"));
        assert!(json.contains("\"fault\":\"exception\""));
    }

    #[test]
    fn set_expiry_round_trips() {
        let at = Utc::now();
        let doc = RuleDocument::new(vec![RuleUnit {
            selector: "a@b".into(),
            fault: RuleFault::Delay,
            content: "sleep(100);".into(),
            line_num: 7,
            expire_at: Some(at),
        }]);
        let json = serde_json::to_string(&doc).unwrap();
        let back: RuleDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
    }
}
