//! # File System Operations Module / 文件系统操作模块
//!
//! This module turns the paths given on the command line into the list of
//! notebook files to test.
//!
//! 此模块将命令行中给出的路径转换为待测试的笔记本文件列表。

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::NotebookError;

const NOTEBOOK_EXTENSION: &str = "ipynb";
const CHECKPOINT_DIR: &str = ".ipynb_checkpoints";

/// Expands files and directories into a sorted, de-duplicated list of notebooks.
///
/// Files are taken as given, whatever their extension. Directories are walked
/// recursively for `*.ipynb` files; Jupyter checkpoint directories are skipped.
///
/// # Arguments
/// * `inputs` - Paths given by the user
///
/// # Returns
/// The notebook paths, or an error if an input does not exist
pub fn discover_notebooks(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut found = BTreeSet::new();

    for input in inputs {
        if is_directory(input) {
            collect_dir(input, &mut found)?;
        } else if input.exists() {
            found.insert(input.clone());
        } else {
            return Err(NotebookError::NotFound(input.clone()).into());
        }
    }

    Ok(found.into_iter().collect())
}

fn collect_dir(dir: &Path, found: &mut BTreeSet<PathBuf>) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read directory: {}", dir.display()))?;

    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            if path.file_name().is_some_and(|name| name == CHECKPOINT_DIR) {
                continue;
            }
            collect_dir(&path, found)?;
        } else if path.extension().is_some_and(|ext| ext == NOTEBOOK_EXTENSION) {
            found.insert(path);
        }
    }

    Ok(())
}

/// Checks if a path exists and is a directory.
pub fn is_directory(path: &Path) -> bool {
    path.exists() && path.is_dir()
}

/// Gets the directory a notebook lives in, used as the kernel's working directory.
pub fn notebook_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
