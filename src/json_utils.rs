use serde::de::DeserializeOwned;
use tracing::{debug, instrument, trace};

use crate::error::AttemptError;

/// Type of a JSON node found by the structure scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Object,
    Array,
}

/// Coordinates of a JSON structure within a larger text, including nested children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjCoords {
    pub start: usize,
    pub end: usize, // inclusive index of the closing bracket/brace
    pub kind: NodeType,
    pub children: Vec<ObjCoords>,
}

impl ObjCoords {
    pub fn new(start: usize, end: usize, kind: NodeType, children: Vec<ObjCoords>) -> Self {
        Self { start, end, kind, children }
    }

    fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..=self.end]
    }
}

#[derive(Debug)]
struct Frame {
    start: usize,
    kind: NodeType,
    children: Vec<ObjCoords>,
}

/// Find all balanced JSON object/array structures in the given text.
/// Coordinates are byte indices; brackets inside string literals are ignored.
#[instrument(target = "study_buddy::json", skip(text), fields(text_len = text.len()))]
pub fn find_json_structures(text: &str) -> Vec<ObjCoords> {
    let mut results: Vec<ObjCoords> = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();

    let mut in_string = false;
    let mut escape = false;

    for (i, &b) in text.as_bytes().iter().enumerate() {
        if in_string {
            if escape {
                escape = false;
                continue;
            }
            match b {
                b'\\' => escape = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        let closing = match b {
            b'"' => {
                in_string = true;
                None
            }
            b'{' => {
                stack.push(Frame { start: i, kind: NodeType::Object, children: Vec::new() });
                None
            }
            b'[' => {
                stack.push(Frame { start: i, kind: NodeType::Array, children: Vec::new() });
                None
            }
            b'}' => Some(NodeType::Object),
            b']' => Some(NodeType::Array),
            _ => None,
        };

        let Some(kind) = closing else { continue };
        // Unbalanced closers are dropped along with their frame
        if let Some(frame) = stack.pop() {
            if frame.kind == kind {
                let node = ObjCoords::new(frame.start, i, kind, frame.children);
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => results.push(node),
                }
            }
        }
    }

    debug!(target: "study_buddy::json", count = results.len(), "found root structures");
    results
}

/// Extract the first `T` from a model response.
///
/// The whole text is tried first, then every JSON structure parent-first in
/// discovery order. A response without any JSON structure yields
/// [`AttemptError::NoStructuredData`]; one whose structures all fail to
/// deserialize yields the last deserialization error.
#[instrument(target = "study_buddy::json", skip(text), fields(text_len = text.len()))]
pub fn extract_first<T: DeserializeOwned>(text: &str) -> Result<T, AttemptError> {
    let mut last_error = match serde_json::from_str::<T>(text.trim()) {
        Ok(v) => return Ok(v),
        Err(e) => e,
    };

    fn descend<T: DeserializeOwned>(
        text: &str,
        node: &ObjCoords,
        last_error: &mut serde_json::Error,
    ) -> Option<T> {
        match serde_json::from_str::<T>(node.slice(text)) {
            Ok(v) => return Some(v),
            Err(e) => {
                trace!(target: "study_buddy::json", start = node.start, end = node.end, error = %e, "candidate rejected");
                *last_error = e;
            }
        }
        node.children.iter().find_map(|child| descend(text, child, last_error))
    }

    let roots = find_json_structures(text);
    if roots.is_empty() {
        return Err(AttemptError::NoStructuredData(text.to_string()));
    }

    for node in &roots {
        if let Some(v) = descend::<T>(text, node, &mut last_error) {
            return Ok(v);
        }
    }

    Err(AttemptError::JsonDeserialization(last_error, text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        x: i32,
    }

    #[test]
    fn finds_nested_structures() {
        let text = r#"noise {"a": [1, {"b": 2}]} tail [3]"#;
        let roots = find_json_structures(text);
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].kind, NodeType::Object);
        assert_eq!(roots[0].children.len(), 1);
        assert_eq!(roots[0].children[0].kind, NodeType::Array);
        assert_eq!(roots[1].kind, NodeType::Array);
        assert_eq!(&text[roots[1].start..=roots[1].end], "[3]");
    }

    #[test]
    fn ignores_brackets_inside_strings() {
        let text = r#"{"q": "what is {this} and [that]?"}"#;
        let roots = find_json_structures(text);
        assert_eq!(roots.len(), 1);
        assert!(roots[0].children.is_empty());
        assert_eq!(roots[0].end, text.len() - 1);
    }

    #[test]
    fn extracts_from_plain_json() {
        let item: Item = extract_first(r#" {"x": 1} "#).unwrap();
        assert_eq!(item, Item { x: 1 });
    }

    #[test]
    fn extracts_from_markdown_fence_and_prose() {
        let text = "Here you go:\n```json\n{\"x\": 7}\n```\nGood luck!";
        let item: Item = extract_first(text).unwrap();
        assert_eq!(item.x, 7);
    }

    #[test]
    fn skips_non_matching_structures() {
        let text = r#"{"y": 1} then {"wrapper": {"x": 3}}"#;
        let item: Item = extract_first(text).unwrap();
        assert_eq!(item.x, 3);
    }

    #[test]
    fn reports_missing_json() {
        let err = extract_first::<Item>("no json here").unwrap_err();
        assert!(matches!(err, AttemptError::NoStructuredData(raw) if raw == "no json here"));
    }

    #[test]
    fn reports_deserialization_failure_with_raw_text() {
        let err = extract_first::<Item>(r#"answer: {"x": "not a number"}"#).unwrap_err();
        match err {
            AttemptError::JsonDeserialization(_, raw) => assert!(raw.starts_with("answer:")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
