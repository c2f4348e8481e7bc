//! Writes extracted code blocks to files.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use ollama_stream::CodeBlock;

/// Extension used when a block has no usable language tag.
const FALLBACK_EXTENSION: &str = "txt";

/// Saves each block as `<dir>/block_<n>.<language>`, numbering from 1.
#[derive(Debug)]
pub struct BlockWriter {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl BlockWriter {
    /// Writer saving into `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
        }
    }

    /// Save one block and return its path.
    pub fn write(&mut self, block: &CodeBlock) -> io::Result<PathBuf> {
        let path = self
            .dir
            .join(file_name(self.written.len() + 1, &block.language));
        let mut file = open_file(&path)?;
        file.write_all(block.code.as_bytes())?;
        tracing::info!(path = %path.display(), language = %block.language, "saved code block");
        self.written.push(path.clone());
        Ok(path)
    }

    /// Paths written so far, in order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

/// Open `path` for writing, creating missing parent directories and
/// truncating an existing file.
pub fn open_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
}

fn file_name(index: usize, language: &str) -> String {
    let ext: String = language
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '_'))
        .collect();
    let ext = if ext.is_empty() {
        FALLBACK_EXTENSION
    } else {
        &ext
    };
    format!("block_{index}.{ext}")
}
