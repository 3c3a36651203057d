use serde::{Deserialize, Serialize};

/// One human-readable instruction line within a plan.
pub type Step = String;

/// Ordered list of steps. Serializes as a bare JSON array of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plan {
    pub steps: Vec<Step>,
}

impl Plan {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Turn free-form model output into a plan.
    ///
    /// Lines are split on any newline style, trimmed, and blank lines are
    /// dropped. A leading enumeration marker such as `1.`, `2)` or `3 ` is
    /// removed from each remaining line; a line holding nothing but a marker
    /// is dropped as well, so a reply made only of markers such as `"1.\n2)"`
    /// yields an empty plan. Callers treat an empty plan like a blank reply.
    pub fn from_reply(raw: &str) -> Self {
        let steps = raw
            .split(['\r', '\n'])
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(strip_enumeration_marker)
            .filter(|step| !step.is_empty())
            .map(str::to_string)
            .collect();

        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.steps.iter()
    }

    /// Render as `1. first\n2. second`.
    pub fn to_numbered_list(&self) -> String {
        self.steps
            .iter()
            .enumerate()
            .map(|(index, step)| format!("{}. {}", index + 1, step))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<Vec<Step>> for Plan {
    fn from(steps: Vec<Step>) -> Self {
        Self::new(steps)
    }
}

impl IntoIterator for Plan {
    type Item = Step;
    type IntoIter = std::vec::IntoIter<Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.into_iter()
    }
}

/// Drop a leading `<digits>` followed by any run of `.`, `)` or whitespace.
///
/// Lines without leading digits come back unchanged.
pub fn strip_enumeration_marker(line: &str) -> &str {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return line;
    }

    line[digits..].trim_start_matches(|c: char| c == '.' || c == ')' || c.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_reply_strips_mixed_markers_and_blank_lines() {
        let plan = Plan::from_reply("1. Buy milk\n2) Call vendor\n\n3  Pay rent");

        assert_eq!(plan.steps, vec!["Buy milk", "Call vendor", "Pay rent"]);
    }

    #[test]
    fn from_reply_handles_crlf_and_bare_cr() {
        let plan = Plan::from_reply("1. One\r\n2. Two\rThree\r\n");

        assert_eq!(plan.steps, vec!["One", "Two", "Three"]);
    }

    #[test]
    fn from_reply_keeps_unnumbered_lines_and_order() {
        let plan = Plan::from_reply("  Ask for budget  \n1. Book venue\nAsk for budget");

        assert_eq!(
            plan.steps,
            vec!["Ask for budget", "Book venue", "Ask for budget"]
        );
    }

    #[test]
    fn from_reply_of_blank_text_is_empty() {
        assert!(Plan::from_reply("").is_empty());
        assert!(Plan::from_reply("\n\n").is_empty());
        assert!(Plan::from_reply("  \r\n\t\n").is_empty());
    }

    #[test]
    fn from_reply_drops_marker_only_lines() {
        let plan = Plan::from_reply("1.\n2. Real step\n3)");

        assert_eq!(plan.steps, vec!["Real step"]);
    }

    #[test]
    fn strip_marker_consumes_repeated_separators() {
        assert_eq!(strip_enumeration_marker("12.) Ship it"), "Ship it");
        assert_eq!(strip_enumeration_marker("7 . ) done"), "done");
    }

    #[test]
    fn strip_marker_leaves_other_prefixes_alone() {
        assert_eq!(strip_enumeration_marker("- bullet"), "- bullet");
        assert_eq!(strip_enumeration_marker("Step 1. go"), "Step 1. go");
    }

    #[test]
    fn strip_marker_on_digits_glued_to_text() {
        // Digits followed directly by text lose only the digits.
        assert_eq!(strip_enumeration_marker("3rd floor"), "rd floor");
    }

    #[test]
    fn numbered_list_rendering() {
        let plan = Plan::from(vec!["Draft".to_string(), "Send".to_string()]);

        assert_eq!(plan.to_numbered_list(), "1. Draft\n2. Send");
    }

    #[test]
    fn plan_serializes_as_array() {
        let plan = Plan::from(vec!["a".to_string()]);
        let json = serde_json::to_string(&plan).unwrap();

        assert_eq!(json, "[\"a\"]");
    }
}
