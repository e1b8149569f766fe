//! # Flat JSON Configuration Differ
//!
//! `global.json` and `dotnet-tools.json` are small nested JSON documents.
//! To compare two snapshots key by key, each document is flattened into a
//! single-level map whose keys are the object path joined with `:`
//! (`tools:runtimes:dotnet`).
//!
//! Flattened values keep three shapes:
//!
//! - strings (numbers are rendered as strings, `null` as the empty string),
//! - booleans, which stay real booleans,
//! - arrays, rendered as ordered lists of strings.
//!
//! [`compare`] turns two flattened maps into [`JsonChange`] records, and
//! [`apply`] replays such records onto a JSON document.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Number, Value};

use crate::error::{Error, Result};

/// Separator between object keys in a flattened key.
pub const KEY_SEPARATOR: char = ':';

/// A flattened JSON value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlatValue {
    Str(String),
    Bool(bool),
    List(Vec<String>),
}

impl FlatValue {
    fn same_shape(&self, other: &FlatValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    fn to_json(&self) -> Value {
        match self {
            FlatValue::Str(s) => Value::String(s.clone()),
            FlatValue::Bool(b) => Value::Bool(*b),
            FlatValue::List(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
        }
    }
}

impl fmt::Display for FlatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlatValue::Str(s) => f.write_str(s),
            FlatValue::Bool(b) => write!(f, "{}", b),
            FlatValue::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

/// A flattened document, ordered by key.
pub type FlatJson = BTreeMap<String, FlatValue>;

/// How a key changed between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Updated,
    Removed,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Added => f.write_str("added"),
            ChangeKind::Updated => f.write_str("updated"),
            ChangeKind::Removed => f.write_str("removed"),
        }
    }
}

/// One flattened key's delta.
///
/// `value` is the new value for additions and updates and the old value
/// for removals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonChange {
    pub name: String,
    pub value: FlatValue,
    pub kind: ChangeKind,
}

impl fmt::Display for JsonChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.kind, self.name, self.value)
    }
}

/// Flatten raw JSON text.
pub fn flatten(json: &str) -> Result<FlatJson> {
    let value: Value = serde_json::from_str(json)?;
    Ok(flatten_value(&value))
}

/// Flatten a parsed JSON value. A non-object root flattens under the empty key.
pub fn flatten_value(value: &Value) -> FlatJson {
    let mut flat = FlatJson::new();
    flatten_into(&mut flat, String::new(), value);
    flat
}

fn flatten_into(flat: &mut FlatJson, prefix: String, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}{}{}", prefix, KEY_SEPARATOR, key)
                };
                flatten_into(flat, path, child);
            }
        }
        Value::Array(items) => {
            let items = items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                })
                .collect();
            flat.insert(prefix, FlatValue::List(items));
        }
        Value::Bool(b) => {
            flat.insert(prefix, FlatValue::Bool(*b));
        }
        Value::Number(n) => {
            flat.insert(prefix, FlatValue::Str(n.to_string()));
        }
        Value::String(s) => {
            flat.insert(prefix, FlatValue::Str(s.clone()));
        }
        Value::Null => {
            flat.insert(prefix, FlatValue::Str(String::new()));
        }
    }
}

/// Diff two flattened snapshots.
///
/// Records come out ordered by key. A key whose value changes shape
/// (for example from a string to a list) fails with [`Error::TypeMismatch`].
pub fn compare(old: &FlatJson, new: &FlatJson) -> Result<Vec<JsonChange>> {
    let mut changes = Vec::new();

    for (name, old_value) in old {
        match new.get(name) {
            None => changes.push(JsonChange {
                name: name.clone(),
                value: old_value.clone(),
                kind: ChangeKind::Removed,
            }),
            Some(new_value) if !old_value.same_shape(new_value) => {
                return Err(Error::TypeMismatch { key: name.clone() });
            }
            Some(new_value) if new_value != old_value => changes.push(JsonChange {
                name: name.clone(),
                value: new_value.clone(),
                kind: ChangeKind::Updated,
            }),
            Some(_) => {}
        }
    }

    for (name, new_value) in new {
        if !old.contains_key(name) {
            changes.push(JsonChange {
                name: name.clone(),
                value: new_value.clone(),
                kind: ChangeKind::Added,
            });
        }
    }

    changes.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(changes)
}

/// Replay changes onto a JSON document.
///
/// Additions and updates create intermediate objects as needed. Removals
/// delete the key but keep its (possibly now empty) parent object. An
/// update of a numeric value with a numeric string stays a number.
pub fn apply(json: &Value, changes: &[JsonChange]) -> Result<Value> {
    let mut result = json.clone();
    for change in changes {
        let path: Vec<&str> = change.name.split(KEY_SEPARATOR).collect();
        match change.kind {
            ChangeKind::Added | ChangeKind::Updated => {
                set_path(&mut result, &path, &change.value, &change.name)?
            }
            ChangeKind::Removed => remove_path(&mut result, &path),
        }
    }
    Ok(result)
}

fn set_path(root: &mut Value, path: &[&str], value: &FlatValue, name: &str) -> Result<()> {
    let Some((last, parents)) = path.split_last() else {
        return Ok(());
    };

    let mut current = root;
    for segment in parents {
        let Value::Object(map) = current else {
            return Err(Error::TypeMismatch {
                key: name.to_string(),
            });
        };
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    let Value::Object(map) = current else {
        return Err(Error::TypeMismatch {
            key: name.to_string(),
        });
    };

    let new_value = match (map.get(*last), value) {
        (Some(Value::Number(_)), FlatValue::Str(s)) => s
            .parse::<Number>()
            .map(Value::Number)
            .unwrap_or_else(|_| value.to_json()),
        _ => value.to_json(),
    };
    map.insert(last.to_string(), new_value);
    Ok(())
}

fn remove_path(root: &mut Value, path: &[&str]) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let mut current = root;
    for segment in parents {
        match current.get_mut(*segment) {
            Some(next) => current = next,
            None => return,
        }
    }
    if let Value::Object(map) = current {
        map.shift_remove(*last);
    }
}
