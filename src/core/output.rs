//! # Output Records Module / 输出记录模块
//!
//! Typed representation of the output records a code cell produces, as stored in
//! a notebook document and as returned by a kernel session.
//!
//! 代码单元产生的输出记录的类型化表示，既用于笔记本文档中保存的输出，
//! 也用于内核会话返回的新输出。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;

/// A mapping from MIME type to payload, e.g. `{"text/plain": "4"}`.
/// MIME 类型到数据负载的映射。
pub type MimeBundle = Map<String, Value>;

/// Text that may be stored as one string or as an ordered list of line fragments.
///
/// Two values are equal when their fragments concatenate to the same string, so
/// `"a\nb"` equals `["a\n", "b"]`.
///
/// 可能以单个字符串或有序行片段列表形式存储的文本。
/// 当两者的片段拼接后得到相同字符串时视为相等。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MultilineText {
    Single(String),
    Fragments(Vec<String>),
}

impl MultilineText {
    /// Concatenates the fragments with no separator.
    pub fn joined(&self) -> Cow<'_, str> {
        match self {
            MultilineText::Single(text) => Cow::Borrowed(text),
            MultilineText::Fragments(parts) => Cow::Owned(parts.concat()),
        }
    }

    /// Joins fragments with newlines, the way a traceback is shown to a user.
    pub fn as_report(&self) -> Cow<'_, str> {
        match self {
            MultilineText::Single(text) => Cow::Borrowed(text),
            MultilineText::Fragments(parts) => Cow::Owned(parts.join("\n")),
        }
    }
}

impl Default for MultilineText {
    fn default() -> Self {
        MultilineText::Single(String::new())
    }
}

impl PartialEq for MultilineText {
    fn eq(&self, other: &Self) -> bool {
        self.joined() == other.joined()
    }
}

impl Eq for MultilineText {}

impl From<&str> for MultilineText {
    fn from(text: &str) -> Self {
        MultilineText::Single(text.to_string())
    }
}

impl From<MultilineText> for String {
    fn from(text: MultilineText) -> Self {
        match text {
            MultilineText::Single(text) => text,
            MultilineText::Fragments(parts) => parts.concat(),
        }
    }
}

/// Deserializes a multi-line field straight into a `String`.
pub(crate) fn joined_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    MultilineText::deserialize(deserializer).map(String::from)
}

/// One output record of a code cell, discriminated by `output_type`.
/// 代码单元的一条输出记录，由 `output_type` 区分。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "output_type", rename_all = "snake_case")]
pub enum Output {
    /// Text written to a stream such as `stdout` or `stderr`.
    Stream { name: String, text: MultilineText },
    /// Rich data published with `display()`.
    DisplayData {
        data: MimeBundle,
        metadata: Map<String, Value>,
    },
    /// The value of the last expression of a cell.
    ExecuteResult {
        #[serde(default)]
        execution_count: Option<i64>,
        data: MimeBundle,
        metadata: Map<String, Value>,
    },
    /// An exception raised while the cell ran.
    Error {
        ename: String,
        evalue: String,
        traceback: MultilineText,
    },
}

impl Output {
    pub fn kind(&self) -> OutputKind {
        match self {
            Output::Stream { .. } => OutputKind::Stream,
            Output::DisplayData { .. } => OutputKind::DisplayData,
            Output::ExecuteResult { .. } => OutputKind::ExecuteResult,
            Output::Error { .. } => OutputKind::Error,
        }
    }

    /// Convenience constructor for a stream record.
    pub fn stream(name: &str, text: impl Into<MultilineText>) -> Self {
        Output::Stream {
            name: name.to_string(),
            text: text.into(),
        }
    }

    /// Renders the traceback of an `error` record for display, `None` for other kinds.
    pub fn traceback_report(&self) -> Option<String> {
        match self {
            Output::Error { traceback, .. } => Some(traceback.as_report().into_owned()),
            _ => None,
        }
    }
}

/// The discriminator of an [`Output`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    Stream,
    DisplayData,
    ExecuteResult,
    Error,
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputKind::Stream => "stream",
            OutputKind::DisplayData => "display_data",
            OutputKind::ExecuteResult => "execute_result",
            OutputKind::Error => "error",
        };
        f.write_str(name)
    }
}

/// How the matcher treats the payload stored under one MIME key.
///
/// 匹配器如何处理某个 MIME 键下的数据。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MimeKind {
    /// Multi-line text, compared after joining fragments.
    Text,
    /// Structured JSON, compared by deep equality.
    Json,
    /// Encoded raster image, compared by payload and by its metadata entry.
    Image,
    /// Anything else, compared by deep equality.
    Opaque,
}

impl MimeKind {
    pub fn of(mime: &str) -> Self {
        match mime {
            "text/plain" | "image/svg+xml" => MimeKind::Text,
            "application/json" => MimeKind::Json,
            "image/png" | "image/jpeg" | "image/gif" | "image/webp" | "image/bmp" => {
                MimeKind::Image
            }
            m if m.starts_with("text/") => MimeKind::Text,
            m if m.starts_with("application/") && m.ends_with("+json") => MimeKind::Json,
            _ => MimeKind::Opaque,
        }
    }
}
