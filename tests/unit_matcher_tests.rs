//! # Output Matcher Unit Tests / 输出匹配器单元测试
//!
//! Tests for the structural comparison of output records.
//!
//! 输出记录结构比较的测试。

use notebook_runner::core::matcher::{compare, matches, Difference, Mismatch};
use notebook_runner::core::output::{MimeKind, MultilineText, Output, OutputKind};
use serde_json::{json, Value};

/// Parses an output record the way it is stored in a notebook.
fn output(value: Value) -> Output {
    serde_json::from_value(value).expect("valid output record")
}

fn sample_outputs() -> Vec<Output> {
    vec![
        output(json!({"output_type": "stream", "name": "stdout", "text": ["a\n", "b\n"]})),
        output(json!({
            "output_type": "execute_result",
            "execution_count": 3,
            "data": {"text/plain": ["4"], "application/json": {"x": [1, 2]}},
            "metadata": {}
        })),
        output(json!({
            "output_type": "display_data",
            "data": {"image/png": "iVBORw0KGgo=\n", "text/plain": "<Figure>"},
            "metadata": {"image/png": {"width": 640, "height": 480}}
        })),
        output(json!({
            "output_type": "error",
            "ename": "ValueError",
            "evalue": "bad",
            "traceback": ["Traceback", "ValueError: bad"]
        })),
    ]
}

#[cfg(test)]
mod property_tests {
    use super::*;

    #[test]
    fn test_matches_is_reflexive() {
        let outputs = sample_outputs();
        assert!(matches(&outputs, &outputs));
        assert!(matches(&[], &[]));
    }

    #[test]
    fn test_length_mismatch_fails() {
        let outputs = sample_outputs();
        assert!(!matches(&outputs[..2], &outputs));
        assert!(!matches(&outputs, &outputs[..3]));
        assert_eq!(
            compare(&outputs[..1], &outputs),
            Err(Mismatch::Length {
                expected: 4,
                actual: 1
            })
        );
    }

    #[test]
    fn test_text_normalization_ignores_fragment_splits() {
        let whole = "line one\nline two\nline three\n";
        let splits: Vec<Vec<&str>> = vec![
            vec![whole],
            vec!["line one\n", "line two\n", "line three\n"],
            vec!["line ", "one\nline two", "\nline three\n"],
            vec!["", whole, ""],
        ];

        for split in splits {
            let fragments = MultilineText::Fragments(split.iter().map(|s| s.to_string()).collect());
            assert_eq!(fragments, MultilineText::from(whole));
            assert!(matches(
                &[Output::stream("stdout", whole)],
                &[Output::Stream {
                    name: "stdout".to_string(),
                    text: fragments
                }]
            ));
        }
    }

    #[test]
    fn test_positional_order_matters() {
        let a = Output::stream("stdout", "a");
        let b = Output::stream("stdout", "b");
        assert!(!matches(&[a.clone(), b.clone()], &[b, a]));
    }
}

#[cfg(test)]
mod stream_tests {
    use super::*;

    /// A string and a one-element fragment list are the same text.
    #[test]
    fn test_stream_string_matches_fragment_list() {
        let exec = output(json!({"output_type": "stream", "name": "stdout", "text": "hello\n"}));
        let orig = output(json!({"output_type": "stream", "name": "stdout", "text": ["hello\n"]}));
        assert!(matches(&[exec], &[orig]));
    }

    #[test]
    fn test_stream_name_must_match() {
        let exec = Output::stream("stderr", "hello\n");
        let orig = Output::stream("stdout", "hello\n");
        assert_eq!(
            compare(&[exec], &[orig]),
            Err(Mismatch::At {
                index: 0,
                detail: Difference::StreamName {
                    expected: "stdout".to_string(),
                    actual: "stderr".to_string()
                }
            })
        );
    }

    #[test]
    fn test_stream_whitespace_is_significant() {
        let exec = Output::stream("stdout", "hello\n");
        let orig = Output::stream("stdout", "hello");
        assert!(!matches(&[exec], &[orig]));
    }
}

#[cfg(test)]
mod kind_tests {
    use super::*;

    #[test]
    fn test_kind_mismatch_fails() {
        let exec = output(json!({"output_type": "display_data", "data": {"text/plain": "4"}, "metadata": {}}));
        let orig = output(json!({
            "output_type": "execute_result",
            "execution_count": 1,
            "data": {"text/plain": "4"},
            "metadata": {}
        }));
        assert_eq!(
            compare(&[exec], &[orig]),
            Err(Mismatch::At {
                index: 0,
                detail: Difference::Kind {
                    expected: OutputKind::ExecuteResult,
                    actual: OutputKind::DisplayData
                }
            })
        );
    }

    #[test]
    fn test_first_mismatch_is_reported() {
        let exec = vec![Output::stream("stdout", "a"), Output::stream("stdout", "x")];
        let orig = vec![Output::stream("stdout", "a"), Output::stream("stdout", "b")];
        assert_eq!(
            compare(&exec, &orig),
            Err(Mismatch::At {
                index: 1,
                detail: Difference::StreamText
            })
        );
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    fn error(ename: &str, evalue: &str, traceback: Value) -> Output {
        output(json!({"output_type": "error", "ename": ename, "evalue": evalue, "traceback": traceback}))
    }

    #[test]
    fn test_identical_errors_match() {
        let tb = json!(["Traceback (most recent call last)", "ZeroDivisionError: division by zero"]);
        assert!(matches(
            &[error("ZeroDivisionError", "division by zero", tb.clone())],
            &[error("ZeroDivisionError", "division by zero", tb)]
        ));
    }

    #[test]
    fn test_each_error_field_is_compared() {
        let tb = json!(["tb"]);
        let orig = error("KeyError", "'a'", tb.clone());

        let cases = [
            (error("IndexError", "'a'", tb.clone()), "ename"),
            (error("KeyError", "'b'", tb.clone()), "evalue"),
            (error("KeyError", "'a'", json!(["other"])), "traceback"),
        ];
        for (exec, field) in cases {
            assert_eq!(
                compare(&[exec], &[orig.clone()]),
                Err(Mismatch::At {
                    index: 0,
                    detail: Difference::ErrorField(field)
                })
            );
        }
    }
}

#[cfg(test)]
mod bundle_tests {
    use super::*;

    fn result(data: Value, metadata: Value) -> Output {
        output(json!({
            "output_type": "execute_result",
            "execution_count": 1,
            "data": data,
            "metadata": metadata
        }))
    }

    /// Different plain-text values do not match.
    #[test]
    fn test_plain_text_difference_fails() {
        let exec = result(json!({"text/plain": "4"}), json!({}));
        let orig = result(json!({"text/plain": "5"}), json!({}));
        assert!(!matches(&[exec], &[orig]));
    }

    /// The same image with different metadata does not match.
    #[test]
    fn test_image_metadata_difference_fails() {
        let exec = result(
            json!({"image/png": "AAA", "text/plain": "x"}),
            json!({"image/png": {"width": 10}}),
        );
        let orig = result(
            json!({"image/png": "AAA", "text/plain": "x"}),
            json!({"image/png": {"width": 20}}),
        );
        assert_eq!(
            compare(&[exec], &[orig]),
            Err(Mismatch::At {
                index: 0,
                detail: Difference::DataMetadata("image/png".to_string())
            })
        );
    }

    #[test]
    fn test_image_payload_difference_fails() {
        let exec = result(json!({"image/png": "AAA"}), json!({}));
        let orig = result(json!({"image/png": "AAB"}), json!({}));
        assert!(!matches(&[exec], &[orig]));
    }

    #[test]
    fn test_execution_count_is_ignored() {
        let exec = output(json!({
            "output_type": "execute_result",
            "execution_count": 7,
            "data": {"text/plain": "4"},
            "metadata": {}
        }));
        let orig = output(json!({
            "output_type": "execute_result",
            "execution_count": 2,
            "data": {"text/plain": ["4"]},
            "metadata": {}
        }));
        assert!(matches(&[exec], &[orig]));
    }

    #[test]
    fn test_key_sets_must_be_equal() {
        let exec = result(json!({"text/plain": "x", "text/html": "<b>x</b>"}), json!({}));
        let orig = result(json!({"text/plain": "x"}), json!({}));
        assert_eq!(
            compare(&[exec], &[orig]),
            Err(Mismatch::At {
                index: 0,
                detail: Difference::DataKeys {
                    missing: vec![],
                    unexpected: vec!["text/html".to_string()]
                }
            })
        );
    }

    #[test]
    fn test_json_payload_uses_deep_equality() {
        let exec = result(json!({"application/json": {"a": 1, "b": [1, 2]}}), json!({}));
        let same = result(json!({"application/json": {"b": [1, 2], "a": 1}}), json!({}));
        let different = result(json!({"application/json": {"a": 1, "b": [2, 1]}}), json!({}));
        assert!(matches(&[exec.clone()], &[same]));
        assert!(!matches(&[exec], &[different]));
    }

    #[test]
    fn test_unknown_mime_uses_deep_equality() {
        let exec = result(json!({"application/x-custom": ["a", "b"]}), json!({}));
        let joined = result(json!({"application/x-custom": "ab"}), json!({}));
        assert!(!matches(&[exec.clone()], &[joined]));
        assert!(matches(&[exec.clone()], &[exec]));
    }

    #[test]
    fn test_html_is_compared_as_text() {
        let exec = result(json!({"text/html": "<p>\nhi</p>"}), json!({}));
        let orig = result(json!({"text/html": ["<p>\n", "hi</p>"]}), json!({}));
        assert!(matches(&[exec], &[orig]));
    }

    #[test]
    fn test_display_data_metadata_only_matters_for_images() {
        let exec = output(json!({"output_type": "display_data", "data": {"text/plain": "x"}, "metadata": {"isolated": true}}));
        let orig = output(json!({"output_type": "display_data", "data": {"text/plain": "x"}, "metadata": {}}));
        assert!(matches(&[exec], &[orig]));
    }

    #[test]
    fn test_rich_outputs_require_metadata() {
        let display = json!({"output_type": "display_data", "data": {"text/plain": "x"}});
        let result = json!({
            "output_type": "execute_result",
            "execution_count": 1,
            "data": {"text/plain": "x"}
        });
        assert!(serde_json::from_value::<Output>(display).is_err());
        assert!(serde_json::from_value::<Output>(result).is_err());
    }

    #[test]
    fn test_mime_classification() {
        assert_eq!(MimeKind::of("text/plain"), MimeKind::Text);
        assert_eq!(MimeKind::of("text/markdown"), MimeKind::Text);
        assert_eq!(MimeKind::of("image/svg+xml"), MimeKind::Text);
        assert_eq!(MimeKind::of("application/json"), MimeKind::Json);
        assert_eq!(MimeKind::of("application/vnd.plotly.v1+json"), MimeKind::Json);
        assert_eq!(MimeKind::of("image/png"), MimeKind::Image);
        assert_eq!(MimeKind::of("image/jpeg"), MimeKind::Image);
        assert_eq!(MimeKind::of("application/pdf"), MimeKind::Opaque);
    }
}
