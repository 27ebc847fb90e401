//! Human-readable formatters for values, entries and annotated trees
//!
//! Output uses a compact object-literal notation (`{ type: "route", routes:
//! ["a"] }`) so extension authors recognise their own rule definitions.

use super::path::{ErrorPath, PathSegment};
use crate::types::value::format_number;
use crate::types::Value;
use std::collections::HashMap;

/// Format a value on a single line
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(*n),
        Value::String(s) => quote(s),
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", inner.join(", "))
        }
        Value::Object(map) if map.is_empty() => "{}".to_string(),
        Value::Object(map) => {
            let inner: Vec<String> = ordered_keys(map)
                .into_iter()
                .map(|key| format_entry(key, &map[key]))
                .collect();
            format!("{{ {} }}", inner.join(", "))
        }
    }
}

/// Format a single `key: value` entry
pub fn format_entry(key: &str, value: &Value) -> String {
    format!("{}: {}", format_key(key), format_value(value))
}

/// Render `tree` over multiple lines, marking the entry at `path` with
/// `// <-- note`.
///
/// When the path ends in a key the tree does not contain (a typo'd or missing
/// required argument), a synthetic `key: <missing>` entry is added to the
/// enclosing object and marked instead.
pub fn format_tree(tree: &Value, path: &ErrorPath, note: &str) -> String {
    let mut lines = Vec::new();
    render(
        tree,
        None,
        0,
        Some(path.segments()),
        note,
        false,
        &mut lines,
    );
    lines.join("\n")
}

fn render(
    value: &Value,
    label: Option<&str>,
    indent: usize,
    target: Option<&[PathSegment]>,
    note: &str,
    comma: bool,
    lines: &mut Vec<String>,
) {
    let pad = "  ".repeat(indent);
    let prefix = label.map(|l| format!("{}: ", format_key(l))).unwrap_or_default();
    let suffix = if comma { "," } else { "" };
    let marked = matches!(target, Some(t) if t.is_empty());
    let mark = |line: String| {
        if marked {
            format!("{}  // <-- {}", line, note)
        } else {
            line
        }
    };

    match value {
        Value::Object(map) if !map.is_empty() => {
            lines.push(mark(format!("{}{}{{", pad, prefix)));
            for key in ordered_keys(map) {
                let child = descend(target, |seg| matches!(seg, PathSegment::Key(k) if k == key));
                render(&map[key], Some(key), indent + 1, child, note, true, lines);
            }
            if let Some([PathSegment::Key(missing), ..]) = target {
                if !map.contains_key(missing) {
                    lines.push(format!(
                        "{}  {}: <missing>,  // <-- {}",
                        pad,
                        format_key(missing),
                        note
                    ));
                }
            }
            lines.push(format!("{}}}{}", pad, suffix));
        }
        Value::Array(items) if items.iter().any(is_container) => {
            lines.push(mark(format!("{}{}[", pad, prefix)));
            for (i, item) in items.iter().enumerate() {
                let child =
                    descend(target, |seg| matches!(seg, PathSegment::Index(idx) if *idx == i));
                render(item, None, indent + 1, child, note, true, lines);
            }
            lines.push(format!("{}]{}", pad, suffix));
        }
        _ => lines.push(mark(format!("{}{}{}{}", pad, prefix, format_value(value), suffix))),
    }
}

fn descend<'a>(
    target: Option<&'a [PathSegment]>,
    is_match: impl Fn(&PathSegment) -> bool,
) -> Option<&'a [PathSegment]> {
    match target {
        Some([first, rest @ ..]) if is_match(first) => Some(rest),
        _ => None,
    }
}

fn is_container(value: &Value) -> bool {
    match value {
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => false,
    }
}

/// Keys sorted alphabetically, with `type` first
fn ordered_keys(map: &HashMap<String, Value>) -> Vec<&str> {
    let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
    keys.sort_by_key(|k| (*k != "type", *k));
    keys
}

fn format_key(key: &str) -> String {
    let is_ident = key
        .chars()
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if is_ident {
        key.to_string()
    } else {
        quote(key)
    }
}

fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Value {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_format_value_compact() {
        let value = parse(r#"{"type": "setting", "name": "top_menu", "contains": "new"}"#);
        assert_eq!(
            format_value(&value),
            r#"{ type: "setting", contains: "new", name: "top_menu" }"#
        );
        assert_eq!(format_value(&parse("[1, 2.5, true, null]")), "[1, 2.5, true, null]");
    }

    #[test]
    fn test_format_entry_quotes_odd_keys() {
        assert_eq!(format_entry("2xl", &Value::Bool(true)), r#""2xl": true"#);
        assert_eq!(format_entry("min", &Value::from("sm")), r#"min: "sm""#);
    }

    #[test]
    fn test_format_tree_marks_nested_key() {
        let tree = parse(
            r#"[{"type": "user", "admin": true}, {"any": [{"type": "route", "routes": 5}]}]"#,
        );
        let path = ErrorPath::new().index(1).key("any").index(0).key("routes");
        let rendered = format_tree(&tree, &path, "must be an array");

        let expected = [
            "[",
            "  {",
            "    type: \"user\",",
            "    admin: true,",
            "  },",
            "  {",
            "    any: [",
            "      {",
            "        type: \"route\",",
            "        routes: 5,  // <-- must be an array",
            "      },",
            "    ],",
            "  },",
            "]",
        ]
        .join("\n");
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_format_tree_synthesizes_missing_key() {
        let tree = parse(r#"{"type": "outlet-arg", "value": 1}"#);
        let path = ErrorPath::new().key("path");
        let rendered = format_tree(&tree, &path, "required");

        assert!(rendered.contains("  path: <missing>,  // <-- required"));
    }
}
