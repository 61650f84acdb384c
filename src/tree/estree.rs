//! ESTree JSON loader
//!
//! Accepts the JSON a JavaScript host produces from `@typescript-eslint/parser`
//! (or any ESTree producer) with `range: [start, end]` or `start`/`end` on each
//! node. Ranges are JavaScript string indices (UTF-16 code units) and are
//! converted to byte offsets of `source`.

use super::{NodeId, NodeKind, Slot, Span, SyntaxTree, TreeBuilder, TreeError, Value};
use serde_json::{Map, Value as Json};

/// Keys that carry positional or back-reference data rather than structure
const SKIPPED_KEYS: &[&str] = &[
    "type", "range", "loc", "start", "end", "parent", "tokens", "comments",
];

/// Build a tree from ESTree JSON text
pub fn from_json(json: &str, source: &str) -> Result<SyntaxTree, TreeError> {
    let value: Json =
        serde_json::from_str(json).map_err(|e| TreeError::Invalid(e.to_string()))?;
    from_value(&value, source)
}

/// Build a tree from an already-parsed ESTree value
pub fn from_value(value: &Json, source: &str) -> Result<SyntaxTree, TreeError> {
    let object = value
        .as_object()
        .ok_or_else(|| TreeError::Invalid("root is not an object".to_string()))?;
    if !is_node(object) {
        return Err(TreeError::Invalid("root has no 'type'".to_string()));
    }

    let mut loader = Loader {
        builder: TreeBuilder::new(),
        offsets: Utf16Offsets::new(source),
    };
    let root = loader.node(object)?;
    log::debug!("Loaded ESTree with {} nodes", loader.builder.len());
    loader.builder.finish(root, source)
}

fn is_node(object: &Map<String, Json>) -> bool {
    matches!(object.get("type"), Some(Json::String(_)))
}

struct Loader {
    builder: TreeBuilder,
    offsets: Utf16Offsets,
}

impl Loader {
    fn node(&mut self, object: &Map<String, Json>) -> Result<NodeId, TreeError> {
        let type_name = object.get("type").and_then(Json::as_str).unwrap_or("");
        let kind: NodeKind = type_name
            .parse()
            .map_err(|_| TreeError::UnknownKind(type_name.to_string()))?;
        let span = self.span(object, type_name)?;

        let mut fields = Vec::with_capacity(object.len());
        for (key, value) in object {
            if SKIPPED_KEYS.contains(&key.as_str()) {
                continue;
            }
            if let Some(slot) = self.slot(value)? {
                fields.push((key.clone(), slot));
            }
        }

        Ok(self.builder.add(kind, span, fields))
    }

    fn slot(&mut self, value: &Json) -> Result<Option<Slot>, TreeError> {
        Ok(match value {
            Json::Null => Some(Slot::Value(Value::Null)),
            Json::Bool(b) => Some(Slot::Value(Value::Bool(*b))),
            Json::Number(n) => n.as_f64().map(|n| Slot::Value(Value::Number(n))),
            Json::String(s) => Some(Slot::Value(Value::String(s.clone()))),
            Json::Object(object) if is_node(object) => Some(Slot::Node(self.node(object)?)),
            // Regex descriptors, bigint payloads and the like
            Json::Object(_) => None,
            Json::Array(items) => {
                let mut ids = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Json::Object(object) if is_node(object) => {
                            ids.push(Some(self.node(object)?))
                        }
                        // Array holes (`[, a]`) and non-node entries keep their position
                        _ => ids.push(None),
                    }
                }
                Some(Slot::List(ids))
            }
        })
    }

    fn span(&self, object: &Map<String, Json>, type_name: &str) -> Result<Span, TreeError> {
        let (start, end) = match object.get("range").and_then(Json::as_array) {
            Some(range) if range.len() == 2 => (range[0].as_u64(), range[1].as_u64()),
            _ => (
                object.get("start").and_then(Json::as_u64),
                object.get("end").and_then(Json::as_u64),
            ),
        };
        match (start, end) {
            (Some(start), Some(end)) => Ok(Span::new(
                self.offsets.to_byte(start as usize),
                self.offsets.to_byte(end as usize),
            )),
            _ => Err(TreeError::MissingRange(type_name.to_string())),
        }
    }
}

/// UTF-16 index to byte offset conversion
struct Utf16Offsets {
    /// Byte offset per UTF-16 unit; empty for ASCII sources
    table: Vec<usize>,
    len: usize,
}

impl Utf16Offsets {
    fn new(source: &str) -> Self {
        if source.is_ascii() {
            return Self {
                table: Vec::new(),
                len: source.len(),
            };
        }
        let mut table = Vec::with_capacity(source.len() + 1);
        for (byte, ch) in source.char_indices() {
            for _ in 0..ch.len_utf16() {
                table.push(byte);
            }
        }
        table.push(source.len());
        Self {
            table,
            len: source.len(),
        }
    }

    fn to_byte(&self, index: usize) -> usize {
        if self.table.is_empty() {
            return index;
        }
        self.table.get(index).copied().unwrap_or(self.len + index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::CompiledSelector;

    const SOURCE: &str = "source.pipe(x);";

    fn estree() -> String {
        r#"{
            "type": "Program",
            "range": [0, 15],
            "sourceType": "module",
            "comments": [],
            "body": [{
                "type": "ExpressionStatement",
                "range": [0, 15],
                "expression": {
                    "type": "CallExpression",
                    "range": [0, 14],
                    "optional": false,
                    "callee": {
                        "type": "MemberExpression",
                        "range": [0, 11],
                        "computed": false,
                        "optional": false,
                        "object": { "type": "Identifier", "range": [0, 6], "name": "source" },
                        "property": { "type": "Identifier", "range": [7, 11], "name": "pipe" }
                    },
                    "arguments": [
                        { "type": "Identifier", "start": 12, "end": 13, "name": "x" }
                    ]
                }
            }]
        }"#
        .to_string()
    }

    #[test]
    fn test_load_program() {
        let tree = from_json(&estree(), SOURCE).unwrap();
        assert_eq!(tree.len(), 7);
        assert_eq!(tree.root().kind(), NodeKind::Program);
        assert_eq!(tree.root().str("sourceType"), Some("module"));

        let call = tree
            .nodes()
            .find(|n| n.is(NodeKind::CallExpression))
            .unwrap();
        assert_eq!(call.text(), "source.pipe(x)");
        assert_eq!(call.child("callee").unwrap().text(), "source.pipe");
        assert_eq!(call.list("arguments").first().unwrap().name(), Some("x"));
        assert!(call.parent().unwrap().is(NodeKind::ExpressionStatement));
    }

    #[test]
    fn test_unknown_kind() {
        let json = r#"{"type": "Program", "range": [0, 1], "body": [
            {"type": "JSXElement", "range": [0, 1]}
        ]}"#;
        assert_eq!(
            from_json(json, "a").unwrap_err(),
            TreeError::UnknownKind("JSXElement".to_string())
        );
    }

    #[test]
    fn test_missing_range() {
        let json = r#"{"type": "Program", "body": []}"#;
        assert_eq!(
            from_json(json, "").unwrap_err(),
            TreeError::MissingRange("Program".to_string())
        );
    }

    #[test]
    fn test_array_holes_keep_positions() {
        let source = "[, a]";
        let json = r#"{"type": "Program", "range": [0, 5], "body": [
            {"type": "ExpressionStatement", "range": [0, 5], "expression":
                {"type": "ArrayExpression", "range": [0, 5], "elements": [
                    null,
                    {"type": "Identifier", "range": [3, 4], "name": "a"}
                ]}
            }
        ]}"#;
        let tree = from_json(json, source).unwrap();
        let array = tree
            .nodes()
            .find(|n| n.is(NodeKind::ArrayExpression))
            .unwrap();
        let elements = array.list("elements");
        assert_eq!(elements.len(), 2);
        assert!(elements.get(0).is_none());
        assert_eq!(elements.iter().count(), 1);

        let a = elements.get(1).unwrap();
        assert_eq!(a.text(), "a");
        assert_eq!(a.list_index(), Some(1));
        assert_eq!(elements.first().map(|n| n.id()), Some(a.id()));
        assert_eq!(array.children().len(), 1);

        let matching = |selector: &str| {
            let compiled = CompiledSelector::new(selector).unwrap();
            tree.nodes().filter(|n| compiled.matches(*n)).count()
        };
        assert_eq!(matching("ArrayExpression[elements.length=2]"), 1);
        assert_eq!(matching("ArrayExpression[elements.length=1]"), 0);
        assert_eq!(matching("Identifier:nth-child(2)"), 1);
        assert_eq!(matching("Identifier:first-child"), 0);
        assert_eq!(matching("Identifier:last-child"), 1);
    }

    #[test]
    fn test_utf16_ranges_converted() {
        // "λ" is one UTF-16 unit and two bytes; "😀" is two units and four bytes
        let source = "λ😀;x";
        let json = r#"{"type": "Program", "range": [0, 5], "body": [
            {"type": "ExpressionStatement", "range": [4, 5], "expression":
                {"type": "Identifier", "range": [4, 5], "name": "x"}
            }
        ]}"#;
        let tree = from_json(json, source).unwrap();
        let x = tree.nodes().find(|n| n.is(NodeKind::Identifier)).unwrap();
        assert_eq!(x.text(), "x");
        assert_eq!(tree.root().text(), source);
    }
}
