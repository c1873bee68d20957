//! Parser for `wezterm cli list --format json` output.
//!
//! The listing is walked as an arbitrary JSON tree rather than a fixed
//! schema, so nesting changes between multiplexer versions do not break it.
//! Any object carrying a `pane_id` (number or numeric string) is a pane. A
//! non-empty `workspace` field applies to the object and everything nested
//! below it.

use crate::task::domain::{LivePanes, Pane, PaneId};
use serde_json::Value;

/// Parses a pane listing.
///
/// Blank output is an empty listing.
///
/// # Errors
///
/// Returns the JSON error when the output is not valid JSON.
pub fn parse_pane_listing(raw: &[u8]) -> Result<LivePanes, serde_json::Error> {
    let mut panes = LivePanes::new();
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(panes);
    }
    let tree: Value = serde_json::from_slice(raw)?;
    collect_panes(&tree, "", &mut panes);
    Ok(panes)
}

fn collect_panes<'a>(node: &'a Value, inherited_workspace: &'a str, panes: &mut LivePanes) {
    match node {
        Value::Object(fields) => {
            let workspace = fields
                .get("workspace")
                .and_then(Value::as_str)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or(inherited_workspace);
            if let Some(pane_id) = fields.get("pane_id").and_then(pane_id_of) {
                panes.insert(Pane::new(PaneId::new(pane_id), workspace));
            }
            for child in fields.values() {
                collect_panes(child, workspace, panes);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_panes(item, inherited_workspace, panes);
            }
        }
        _ => {}
    }
}

fn pane_id_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::parse_pane_listing;
    use crate::task::domain::PaneId;
    use rstest::rstest;

    fn workspace_of(raw: &str, pane: i64) -> Option<String> {
        let panes = parse_pane_listing(raw.as_bytes()).expect("listing should parse");
        panes
            .get(PaneId::new(pane))
            .map(|found| found.workspace().to_owned())
    }

    #[rstest]
    fn flat_listing_reports_each_pane() {
        let raw = r#"[
            {"window_id": 0, "pane_id": 3, "workspace": "task-a"},
            {"window_id": 1, "pane_id": 7, "workspace": "default"}
        ]"#;
        let panes = parse_pane_listing(raw.as_bytes()).expect("listing should parse");
        assert_eq!(panes.len(), 2);
        assert_eq!(workspace_of(raw, 3).as_deref(), Some("task-a"));
        assert_eq!(workspace_of(raw, 7).as_deref(), Some("default"));
    }

    #[rstest]
    fn nested_panes_inherit_the_ancestor_workspace() {
        let raw = r#"{"windows": [{"workspace": "outer", "tabs": [{"panes": [{"pane_id": 11}]}]}]}"#;
        assert_eq!(workspace_of(raw, 11).as_deref(), Some("outer"));
    }

    #[rstest]
    fn numeric_string_identifiers_are_accepted() {
        let raw = r#"[{"pane_id": " 42 ", "workspace": "w"}]"#;
        assert_eq!(workspace_of(raw, 42).as_deref(), Some("w"));
    }

    #[rstest]
    fn non_numeric_identifiers_are_ignored() {
        let raw = r#"[{"pane_id": "abc"}, {"pane_id": true}, {"pane_id": 5}]"#;
        let panes = parse_pane_listing(raw.as_bytes()).expect("listing should parse");
        assert_eq!(panes.len(), 1);
        assert!(panes.contains(PaneId::new(5)));
    }

    #[rstest]
    fn duplicates_prefer_the_entry_with_a_workspace() {
        let raw = r#"[{"pane_id": 9}, {"pane_id": 9, "workspace": "named"}, {"pane_id": 9, "workspace": "later"}]"#;
        let panes = parse_pane_listing(raw.as_bytes()).expect("listing should parse");
        assert_eq!(panes.len(), 1);
        assert_eq!(workspace_of(raw, 9).as_deref(), Some("named"));
    }

    #[rstest]
    fn missing_workspace_is_empty() {
        assert_eq!(workspace_of(r#"[{"pane_id": 1}]"#, 1).as_deref(), Some(""));
    }

    #[rstest]
    #[case("")]
    #[case("  \n")]
    fn blank_output_is_an_empty_listing(#[case] raw: &str) {
        let panes = parse_pane_listing(raw.as_bytes()).expect("blank output should parse");
        assert!(panes.is_empty());
    }

    #[rstest]
    fn invalid_json_is_rejected() {
        assert!(parse_pane_listing(b"[{").is_err());
    }
}
