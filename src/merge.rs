//! Deep-merge engine for structured configuration documents
//!
//! Combines a generated "desired" document with an arbitrary pre-existing one
//! without discarding keys the user added by hand. All structured scaffolding
//! (editor settings, CI workflows, MCP configs) goes through [`deep_merge`];
//! plain-text artifacts (ignore files, rule prose) use [`merge_text_lines`],
//! which only ever appends lines that are not already present.

use serde_json::Value;

/// How array values are combined when both sides hold an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrayStrategy {
    /// Append source elements not already present in the target, preserving
    /// the target's order. This is the default for all scaffolded artifacts.
    #[default]
    AppendUnique,
    /// Source array wins outright.
    Replace,
}

/// Merge `source` into `target`, returning a new value.
///
/// Rules, key-by-key over `source`:
/// - `null` source values are skipped; a merge never deletes or nulls out an
///   existing target key.
/// - arrays combine per `strategy` (see [`ArrayStrategy`]); if the target
///   value is not an array, the source array wins.
/// - two objects recurse with the same strategy.
/// - anything else (primitives, type mismatches): source wins.
///
/// Keys present only in `target` always survive untouched.
pub fn deep_merge(target: &Value, source: &Value, strategy: ArrayStrategy) -> Value {
    let mut out = target.clone();
    deep_merge_into(&mut out, source, strategy);
    out
}

/// In-place variant of [`deep_merge`] for internal composition of desired
/// fragments. Callers holding user data should prefer the copying form.
pub fn deep_merge_into(target: &mut Value, source: &Value, strategy: ArrayStrategy) {
    let source_map = match source.as_object() {
        Some(m) => m,
        None => {
            if !source.is_null() {
                *target = source.clone();
            }
            return;
        }
    };

    if !target.is_object() {
        *target = Value::Object(Default::default());
    }
    let target_map = target.as_object_mut().expect("target coerced to object");

    for (key, src_val) in source_map {
        if src_val.is_null() {
            continue;
        }

        match target_map.get_mut(key) {
            Some(Value::Array(existing)) => {
                if let (Value::Array(incoming), ArrayStrategy::AppendUnique) = (src_val, strategy)
                {
                    for item in incoming {
                        if !existing.contains(item) {
                            existing.push(item.clone());
                        }
                    }
                    continue;
                }
            }
            Some(tgt_val @ Value::Object(_)) => {
                if src_val.is_object() {
                    deep_merge_into(tgt_val, src_val, strategy);
                    continue;
                }
            }
            _ => {}
        }
        // Replace strategy, type mismatch, or key absent: source wins.
        target_map.insert(key.clone(), src_val.clone());
    }
}

/// Line-based duplicate-suppressed append for text artifacts.
///
/// An empty (or all-whitespace) existing document is replaced by `desired`
/// verbatim. Otherwise only the non-blank lines of `desired` that are not
/// already present (compared after trimming trailing whitespace) are
/// appended, in order. Existing content is never reordered, so hand edits
/// survive, and a document that already contains every desired line comes
/// back unchanged.
pub fn merge_text_lines(existing: &str, desired: &str) -> String {
    if existing.trim().is_empty() {
        let mut out: Vec<&str> = desired.lines().map(|l| l.trim_end()).collect();
        while out.last().map(|l| l.is_empty()).unwrap_or(false) {
            out.pop();
        }
        let mut created = out.join("\n");
        if !created.is_empty() {
            created.push('\n');
        }
        return created;
    }

    let existing_lines: Vec<String> = existing
        .lines()
        .map(|l| l.trim_end().to_string())
        .collect();

    let mut out = existing_lines.clone();
    for line in desired.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        if !out.iter().any(|l| l == line) {
            out.push(line.to_string());
        }
    }

    if out == existing_lines {
        // Nothing to add; leave the document byte-identical.
        return existing.to_string();
    }

    let mut merged = out.join("\n");
    merged.push('\n');
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use yare::parameterized;

    #[test]
    fn test_merge_preserves_unknown_keys() {
        let target = json!({"a": 1, "custom": "x"});
        let source = json!({"b": 2});

        let merged = deep_merge(&target, &source, ArrayStrategy::AppendUnique);

        assert_eq!(merged, json!({"a": 1, "custom": "x", "b": 2}));
    }

    #[test]
    fn test_merge_recurses_nested_objects() {
        let target = json!({"a": {"x": 1, "y": 2}});
        let source = json!({"a": {"y": 4, "z": 5}});

        let merged = deep_merge(&target, &source, ArrayStrategy::AppendUnique);

        assert_eq!(merged, json!({"a": {"x": 1, "y": 4, "z": 5}}));
    }

    #[test]
    fn test_append_unique_arrays() {
        let target = json!({"items": [1, 2, 3]});
        let source = json!({"items": [3, 4, 5]});

        let merged = deep_merge(&target, &source, ArrayStrategy::AppendUnique);

        assert_eq!(merged, json!({"items": [1, 2, 3, 4, 5]}));
    }

    #[test]
    fn test_replace_arrays() {
        let target = json!({"items": [1, 2, 3]});
        let source = json!({"items": [4, 5]});

        let merged = deep_merge(&target, &source, ArrayStrategy::Replace);

        assert_eq!(merged, json!({"items": [4, 5]}));
    }

    #[test]
    fn test_null_source_value_never_deletes() {
        let target = json!({"keep": "me", "other": 1});
        let source = json!({"keep": null, "added": true});

        let merged = deep_merge(&target, &source, ArrayStrategy::AppendUnique);

        assert_eq!(merged, json!({"keep": "me", "other": 1, "added": true}));
    }

    #[test]
    fn test_empty_source_returns_target_unchanged() {
        let target = json!({"a": {"b": [1, 2]}, "c": "text"});

        let merged = deep_merge(&target, &json!({}), ArrayStrategy::AppendUnique);

        assert_eq!(merged, target);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let target = json!({"a": {"x": 1}, "items": [1, 2]});
        let source = json!({"a": {"y": 2}, "items": [2, 3], "flag": true});

        let once = deep_merge(&target, &source, ArrayStrategy::AppendUnique);
        let twice = deep_merge(&once, &source, ArrayStrategy::AppendUnique);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_merge_does_not_mutate_inputs() {
        let target = json!({"a": 1});
        let source = json!({"b": 2});

        let _ = deep_merge(&target, &source, ArrayStrategy::AppendUnique);

        assert_eq!(target, json!({"a": 1}));
        assert_eq!(source, json!({"b": 2}));
    }

    #[parameterized(
        object_over_scalar = { json!({"a": 1}), json!({"a": {"b": 2}}), json!({"a": {"b": 2}}) },
        scalar_over_object = { json!({"a": {"b": 2}}), json!({"a": 1}), json!({"a": 1}) },
        array_over_scalar = { json!({"a": 1}), json!({"a": [1]}), json!({"a": [1]}) },
        scalar_over_array = { json!({"a": [1]}), json!({"a": 2}), json!({"a": 2}) },
    )]
    fn test_type_mismatch_source_wins(target: Value, source: Value, expected: Value) {
        let merged = deep_merge(&target, &source, ArrayStrategy::AppendUnique);
        assert_eq!(merged, expected);
    }

    #[test]
    fn test_append_unique_preserves_order_and_dedups_objects() {
        let target = json!({"recommendations": ["rust-lang.rust-analyzer"]});
        let source = json!({"recommendations": ["esbenp.prettier-vscode", "rust-lang.rust-analyzer"]});

        let merged = deep_merge(&target, &source, ArrayStrategy::AppendUnique);

        assert_eq!(
            merged,
            json!({"recommendations": ["rust-lang.rust-analyzer", "esbenp.prettier-vscode"]})
        );
    }

    #[test]
    fn test_merge_into_non_object_target() {
        let mut target = json!("scalar");
        deep_merge_into(&mut target, &json!({"a": 1}), ArrayStrategy::AppendUnique);
        assert_eq!(target, json!({"a": 1}));
    }

    #[test]
    fn test_text_merge_appends_missing_lines() {
        let existing = "target/\n*.log\n";
        let desired = "*.log\nnode_modules/\n";

        let merged = merge_text_lines(existing, desired);

        assert_eq!(merged, "target/\n*.log\nnode_modules/\n");
    }

    #[test]
    fn test_text_merge_is_idempotent() {
        let desired = ".env\ntarget/\n";

        let once = merge_text_lines("", desired);
        let twice = merge_text_lines(&once, desired);

        assert_eq!(once, twice);
        assert_eq!(once, ".env\ntarget/\n");
    }

    #[test]
    fn test_text_merge_never_reorders_existing() {
        let existing = "b\na\n";
        let merged = merge_text_lines(existing, "a\nc\n");
        assert_eq!(merged, "b\na\nc\n");
    }

    #[test]
    fn test_text_merge_with_blank_lines_is_idempotent() {
        let desired = "# Rules\n\n- first rule\n- second rule\n";

        let once = merge_text_lines("", desired);
        let twice = merge_text_lines(&once, desired);
        let thrice = merge_text_lines(&twice, desired);

        assert_eq!(once, desired);
        assert_eq!(twice, desired);
        assert_eq!(thrice, desired);
    }

    #[test]
    fn test_text_merge_fully_covered_document_is_untouched() {
        let existing = "# My notes\n\ntarget/\ncustom-entry\n";
        let merged = merge_text_lines(existing, "target/\n");
        assert_eq!(merged, existing);
    }
}
