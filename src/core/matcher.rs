//! # Output Matcher Module / 输出匹配模块
//!
//! Strict, positional comparison of freshly produced output records against the
//! records saved in a notebook. There is no fuzzy alignment: the lists must have
//! the same length and every pair must agree on kind and content. The only
//! normalization applied is joining multi-line text fragments.
//!
//! 将新产生的输出记录与笔记本中保存的记录进行严格的按位置比较。
//! 不做模糊对齐：两个列表长度必须相同，且每一对记录的类型和内容都必须一致。
//! 唯一的规范化是拼接多行文本片段。

use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;

use crate::core::output::{MimeBundle, MimeKind, Output, OutputKind};

/// The first difference found between two output lists.
/// 两个输出列表之间发现的第一个差异。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// The lists have different lengths.
    Length { expected: usize, actual: usize },
    /// The records at `index` differ.
    At { index: usize, detail: Difference },
}

/// What differs between two records at the same position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Difference {
    Kind {
        expected: OutputKind,
        actual: OutputKind,
    },
    StreamName {
        expected: String,
        actual: String,
    },
    StreamText,
    ErrorField(&'static str),
    DataKeys {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
    DataValue(String),
    DataMetadata(String),
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::Length { expected, actual } => {
                write!(f, "expected {expected} outputs, got {actual}")
            }
            Mismatch::At { index, detail } => write!(f, "output #{index}: {detail}"),
        }
    }
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difference::Kind { expected, actual } => {
                write!(f, "expected a `{expected}` record, got `{actual}`")
            }
            Difference::StreamName { expected, actual } => {
                write!(f, "expected stream `{expected}`, got `{actual}`")
            }
            Difference::StreamText => f.write_str("stream text differs"),
            Difference::ErrorField(field) => write!(f, "error field `{field}` differs"),
            Difference::DataKeys {
                missing,
                unexpected,
            } => write!(
                f,
                "data keys differ (missing: [{}], unexpected: [{}])",
                missing.join(", "),
                unexpected.join(", ")
            ),
            Difference::DataValue(key) => write!(f, "`{key}` payload differs"),
            Difference::DataMetadata(key) => write!(f, "`{key}` metadata differs"),
        }
    }
}

/// Returns `true` when `exec_outputs` structurally equals `original`.
///
/// 当 `exec_outputs` 在结构上等于 `original` 时返回 `true`。
pub fn matches(exec_outputs: &[Output], original: &[Output]) -> bool {
    compare(exec_outputs, original).is_ok()
}

/// Compares two output lists and reports the first difference.
///
/// # Arguments
/// * `exec_outputs` - Outputs produced by the current execution
/// * `original` - Outputs recorded in the notebook
pub fn compare(exec_outputs: &[Output], original: &[Output]) -> Result<(), Mismatch> {
    if exec_outputs.len() != original.len() {
        return Err(Mismatch::Length {
            expected: original.len(),
            actual: exec_outputs.len(),
        });
    }

    for (index, (exec, orig)) in exec_outputs.iter().zip(original).enumerate() {
        compare_output(exec, orig).map_err(|detail| Mismatch::At { index, detail })?;
    }

    Ok(())
}

fn compare_output(exec: &Output, orig: &Output) -> Result<(), Difference> {
    match (exec, orig) {
        (
            Output::Stream { name, text },
            Output::Stream {
                name: orig_name,
                text: orig_text,
            },
        ) => {
            if name != orig_name {
                return Err(Difference::StreamName {
                    expected: orig_name.clone(),
                    actual: name.clone(),
                });
            }
            if text != orig_text {
                return Err(Difference::StreamText);
            }
            Ok(())
        }
        (
            Output::Error {
                ename,
                evalue,
                traceback,
            },
            Output::Error {
                ename: orig_ename,
                evalue: orig_evalue,
                traceback: orig_traceback,
            },
        ) => {
            if ename != orig_ename {
                return Err(Difference::ErrorField("ename"));
            }
            if evalue != orig_evalue {
                return Err(Difference::ErrorField("evalue"));
            }
            if traceback != orig_traceback {
                return Err(Difference::ErrorField("traceback"));
            }
            Ok(())
        }
        (
            Output::DisplayData { data, metadata },
            Output::DisplayData {
                data: orig_data,
                metadata: orig_metadata,
            },
        )
        | (
            Output::ExecuteResult { data, metadata, .. },
            Output::ExecuteResult {
                data: orig_data,
                metadata: orig_metadata,
                ..
            },
        ) => compare_bundles(data, metadata, orig_data, orig_metadata),
        _ => Err(Difference::Kind {
            expected: orig.kind(),
            actual: exec.kind(),
        }),
    }
}

fn compare_bundles(
    data: &MimeBundle,
    metadata: &Map<String, Value>,
    orig_data: &MimeBundle,
    orig_metadata: &Map<String, Value>,
) -> Result<(), Difference> {
    let keys: BTreeSet<&String> = data.keys().collect();
    let orig_keys: BTreeSet<&String> = orig_data.keys().collect();
    if keys != orig_keys {
        return Err(Difference::DataKeys {
            missing: orig_keys.difference(&keys).map(|k| k.to_string()).collect(),
            unexpected: keys.difference(&orig_keys).map(|k| k.to_string()).collect(),
        });
    }

    for (key, value) in data {
        // Key sets are equal, so the lookup cannot miss.
        let Some(orig_value) = orig_data.get(key) else {
            continue;
        };

        let same = match MimeKind::of(key) {
            MimeKind::Text => same_text(value, orig_value),
            MimeKind::Json | MimeKind::Opaque => value == orig_value,
            MimeKind::Image => {
                if value != orig_value {
                    false
                } else if metadata.get(key) != orig_metadata.get(key) {
                    return Err(Difference::DataMetadata(key.clone()));
                } else {
                    true
                }
            }
        };

        if !same {
            return Err(Difference::DataValue(key.clone()));
        }
    }

    Ok(())
}

/// Compares two JSON values as multi-line text, falling back to deep equality
/// when either side is not a string or a list of strings.
fn same_text(value: &Value, orig_value: &Value) -> bool {
    match (text_of(value), text_of(orig_value)) {
        (Some(text), Some(orig_text)) => text == orig_text,
        _ => value == orig_value,
    }
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Array(parts) => parts
            .iter()
            .map(|part| part.as_str())
            .collect::<Option<Vec<_>>>()
            .map(|parts| parts.concat()),
        _ => None,
    }
}
