//! Accumulated validation messages.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A validation problem attached to a condition node.
///
/// Messages are collected rather than raised so a caller can present every
/// problem of a condition at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionErrorMessage {
    /// Location of the offending value, e.g. `[0][age][2]`.
    pub path: String,
    /// Rendered message.
    pub message: String,
    /// Message template with `{{ name }}` placeholders, for translation.
    pub template: String,
    /// Template parameters.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
}

impl ConditionErrorMessage {
    /// Creates a message from a template and its parameters.
    ///
    /// Every `{{ key }}` in the template is replaced by the parameter value.
    pub fn new(
        path: impl Into<String>,
        template: impl Into<String>,
        parameters: impl IntoIterator<Item = (&'static str, String)>,
    ) -> Self {
        let template = template.into();
        let parameters: BTreeMap<String, String> = parameters
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();

        let mut message = template.clone();
        for (key, value) in &parameters {
            message = message.replace(&format!("{{{{ {} }}}}", key), value);
        }

        Self {
            path: path.into(),
            message,
            template,
            parameters,
        }
    }
}

impl fmt::Display for ConditionErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Builds the path of a value inside a group.
pub(crate) fn value_path(group_path: &str, field: &str, index: usize) -> String {
    format!("{}[{}][{}]", group_path, field, index)
}

/// Builds the path of a child group.
pub(crate) fn group_path(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_template_rendering() {
        let msg = ConditionErrorMessage::new(
            "[age][0]",
            "Lower bound {{ lower }} is greater than upper bound {{ upper }}.",
            [("lower", "10".to_string()), ("upper", "5".to_string())],
        );
        assert_eq!(msg.message, "Lower bound 10 is greater than upper bound 5.");
        assert_eq!(msg.parameters.len(), 2);
        assert_eq!(msg.to_string(), format!("[age][0]: {}", msg.message));
    }

    #[test]
    fn test_paths() {
        let group = group_path(&group_path("", 0), 2);
        assert_eq!(group, "[0][2]");
        assert_eq!(value_path(&group, "name", 1), "[0][2][name][1]");
    }
}
