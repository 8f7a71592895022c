//! Rebuilding a directory tree from a flat file.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::mem;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::domain::format::Line;
use crate::domain::model::FileBlock;
use crate::infra::fs::{resolve_target, write_file};

#[derive(Debug, Default)]
enum State {
    #[default]
    Idle,
    Collecting {
        path: String,
        content: String,
    },
}

/// Single-pass, line-oriented block parser.
///
/// Lines outside a block are ignored. A start tag inside an open block closes
/// it without an end tag, but only yields it when some content was collected.
/// An end tag always yields the open block, even when it is empty.
#[derive(Debug, Default)]
pub struct BlockParser {
    state: State,
}

impl BlockParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line without its terminator, returning a block it completes.
    pub fn push_line(&mut self, line: &str) -> Option<FileBlock> {
        match Line::classify(line) {
            Line::Start(path) => {
                let finished = match mem::take(&mut self.state) {
                    State::Collecting {
                        path: previous,
                        content,
                    } if !content.is_empty() => Some(FileBlock {
                        path: previous,
                        content,
                    }),
                    _ => None,
                };
                if path.is_empty() {
                    tracing::warn!("start tag without a path, block ignored");
                } else {
                    self.state = State::Collecting {
                        path: path.to_owned(),
                        content: String::new(),
                    };
                }
                finished
            }
            Line::End => match mem::take(&mut self.state) {
                State::Collecting { path, content } => Some(FileBlock { path, content }),
                State::Idle => None,
            },
            Line::Content(text) => {
                if let State::Collecting { content, .. } = &mut self.state {
                    content.push_str(text);
                    content.push('\n');
                }
                None
            }
        }
    }

    /// Flush a block left open at end of input, if it collected anything.
    pub fn finish(self) -> Option<FileBlock> {
        match self.state {
            State::Collecting { path, content } if !content.is_empty() => {
                Some(FileBlock { path, content })
            }
            _ => None,
        }
    }
}

/// Parse an in-memory flat file.
pub fn parse_blocks(text: &str) -> Vec<FileBlock> {
    let mut parser = BlockParser::new();
    let mut blocks: Vec<FileBlock> = text
        .lines()
        .filter_map(|line| parser.push_line(line))
        .collect();
    blocks.extend(parser.finish());
    blocks
}

/// Inputs for a reconstruct run.
#[derive(Debug, Clone)]
pub struct ReconstructOptions {
    pub input: PathBuf,
    /// Directory blocks are written under; `None` means the working directory.
    pub output_dir: Option<PathBuf>,
}

impl ReconstructOptions {
    pub fn new(input: impl Into<PathBuf>, output_dir: Option<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output_dir: output_dir.filter(|dir| !dir.as_os_str().is_empty()),
        }
    }
}

/// Summary of a completed reconstruct run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconstructReport {
    pub files: usize,
    pub bytes: u64,
}

/// Streams a flat file through [`BlockParser`] and writes each block out.
#[derive(Debug, Default)]
pub struct Reconstructor;

impl Reconstructor {
    pub fn new() -> Self {
        Self
    }

    pub fn reconstruct(&self, options: &ReconstructOptions) -> Result<ReconstructReport> {
        let file = File::open(&options.input)
            .with_context(|| format!("failed to open flat file {}", options.input.display()))?;
        let reader = BufReader::new(file);

        let mut parser = BlockParser::new();
        let mut report = ReconstructReport::default();

        for (index, line) in reader.lines().enumerate() {
            let line = line.with_context(|| {
                format!(
                    "failed to read line {} of {}",
                    index + 1,
                    options.input.display()
                )
            })?;
            if let Some(block) = parser.push_line(&line) {
                materialize(&block, options, &mut report)?;
            }
        }

        if let Some(block) = parser.finish() {
            materialize(&block, options, &mut report)?;
        }

        Ok(report)
    }
}

fn materialize(
    block: &FileBlock,
    options: &ReconstructOptions,
    report: &mut ReconstructReport,
) -> Result<()> {
    let target = resolve_target(options.output_dir.as_deref(), &block.path)?;
    write_file(&target, &block.content)?;
    tracing::debug!(path = %target.display(), bytes = block.content.len(), "reconstructed file");
    report.files += 1;
    report.bytes += block.content.len() as u64;
    Ok(())
}
