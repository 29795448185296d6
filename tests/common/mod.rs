// Shared test helpers for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use notebook_runner::core::error::SessionError;
use notebook_runner::core::execution::{Execution, ExecutorSession, SessionFactory};
use notebook_runner::core::notebook::Notebook;
use notebook_runner::core::output::Output;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::{tempdir, TempDir};

/// A source that makes the scripted session sleep far longer than any test timeout.
pub const HANG: &str = "__hang__";
/// A source that makes the scripted session fail as if the kernel died.
pub const BROKEN: &str = "__broken__";

/// Counters shared between a scripted factory and the sessions it hands out.
#[derive(Debug, Default)]
pub struct SessionLog {
    pub acquired: AtomicUsize,
    pub shutdowns: AtomicUsize,
    pub dropped: AtomicUsize,
    pub seeds: Mutex<Vec<i64>>,
    pub notebooks: Mutex<Vec<PathBuf>>,
    pub sources: Mutex<Vec<String>>,
}

impl SessionLog {
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

/// A session that answers from a table instead of a real kernel.
/// Unknown sources succeed with no outputs.
pub struct ScriptedSession {
    responses: Arc<HashMap<String, Execution>>,
    log: Arc<SessionLog>,
}

impl ScriptedSession {
    pub fn new(responses: HashMap<String, Execution>) -> (Self, Arc<SessionLog>) {
        let log = Arc::new(SessionLog::default());
        (
            Self {
                responses: Arc::new(responses),
                log: Arc::clone(&log),
            },
            log,
        )
    }
}

#[async_trait]
impl ExecutorSession for ScriptedSession {
    async fn execute(&mut self, source: &str) -> Result<Execution, SessionError> {
        self.log.sources.lock().unwrap().push(source.to_string());
        match source {
            HANG => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(Execution::default())
            }
            BROKEN => Err(SessionError::Closed),
            _ => Ok(self.responses.get(source).cloned().unwrap_or_default()),
        }
    }

    async fn shutdown(&mut self) -> Result<(), SessionError> {
        self.log.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Drop for ScriptedSession {
    fn drop(&mut self) {
        self.log.dropped.fetch_add(1, Ordering::SeqCst);
    }
}

/// A factory handing out scripted sessions that all share one log.
#[derive(Default)]
pub struct ScriptedFactory {
    pub responses: Arc<HashMap<String, Execution>>,
    pub log: Arc<SessionLog>,
    /// File names of notebooks whose session cannot be started.
    pub refuse: HashSet<String>,
}

impl ScriptedFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, source: &str, execution: Execution) -> Self {
        Arc::make_mut(&mut self.responses).insert(source.to_string(), execution);
        self
    }

    pub fn refusing(mut self, file_name: &str) -> Self {
        self.refuse.insert(file_name.to_string());
        self
    }
}

#[async_trait]
impl SessionFactory for ScriptedFactory {
    async fn acquire(
        &self,
        notebook: &Notebook,
        seed: i64,
    ) -> Result<Box<dyn ExecutorSession>, SessionError> {
        let name = notebook
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if self.refuse.contains(&name) {
            return Err(SessionError::Bridge(format!("no kernel for {name}")));
        }

        self.log.acquired.fetch_add(1, Ordering::SeqCst);
        self.log.seeds.lock().unwrap().push(seed);
        self.log
            .notebooks
            .lock()
            .unwrap()
            .push(notebook.path().to_path_buf());

        Ok(Box::new(ScriptedSession {
            responses: Arc::clone(&self.responses),
            log: Arc::clone(&self.log),
        }))
    }
}

/// A code cell document with the given source and recorded outputs.
pub fn code_cell(source: &str, outputs: Value) -> Value {
    json!({
        "cell_type": "code",
        "execution_count": 1,
        "metadata": {},
        "source": source,
        "outputs": outputs,
    })
}

/// A markdown cell document.
pub fn markdown_cell(source: &str) -> Value {
    json!({
        "cell_type": "markdown",
        "metadata": {},
        "source": source,
    })
}

/// A full nbformat 4 document around `cells`.
pub fn notebook_json(cells: Vec<Value>) -> String {
    json!({
        "cells": cells,
        "metadata": {
            "kernelspec": {"name": "python3", "display_name": "Python 3", "language": "python"},
            "language_info": {"name": "python"}
        },
        "nbformat": 4,
        "nbformat_minor": 5
    })
    .to_string()
}

pub fn parse_notebook(name: &str, cells: Vec<Value>) -> Notebook {
    Notebook::parse(name, &notebook_json(cells)).expect("fixture notebook should parse")
}

/// Writes a notebook document to `dir/name` and returns its path.
pub fn write_notebook(dir: &Path, name: &str, cells: Vec<Value>) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, notebook_json(cells)).expect("Failed to write notebook");
    path
}

/// Writes a document whose second cell lacks its `outputs` field.
pub fn write_malformed_notebook(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let content = json!({
        "cells": [
            markdown_cell("# Broken"),
            {"cell_type": "code", "execution_count": null, "metadata": {}, "source": "x = 1"}
        ],
        "metadata": {},
        "nbformat": 4,
        "nbformat_minor": 5
    });
    fs::write(&path, content.to_string()).expect("Failed to write notebook");
    path
}

pub fn setup_test_environment() -> TempDir {
    tempdir().expect("Failed to create temporary directory")
}

pub fn stdout_output(text: &str) -> Output {
    Output::stream("stdout", text)
}
