//! Flattening a directory tree into a single tagged-block file.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;

use crate::domain::errors::DomainError;
use crate::domain::format;
use crate::domain::model::{ExtensionFilter, FileBlock};
use crate::infra::config::Config;

/// Inputs for a flatten run.
#[derive(Debug, Clone)]
pub struct FlattenOptions {
    pub root: PathBuf,
    pub filter: ExtensionFilter,
    pub output: PathBuf,
    /// Record paths relative to `root` instead of as walked.
    pub relative_paths: bool,
    pub follow_links: bool,
    /// Globs matched against root-relative paths and pruned from the walk.
    pub ignore_globs: Vec<String>,
}

impl FlattenOptions {
    pub fn new(
        root: impl Into<PathBuf>,
        filter: ExtensionFilter,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            root: root.into(),
            filter,
            output: output.into(),
            relative_paths: false,
            follow_links: false,
            ignore_globs: Vec::new(),
        }
    }

    /// Build options with walk settings taken from configuration.
    pub fn from_config(
        root: impl Into<PathBuf>,
        filter: ExtensionFilter,
        output: impl Into<PathBuf>,
        config: &Config,
    ) -> Self {
        Self {
            relative_paths: config.flatten.relative_paths(),
            follow_links: config.flatten.follow_links(),
            ignore_globs: config.flatten.ignore_globs.clone(),
            ..Self::new(root, filter, output)
        }
    }

    pub fn with_relative_paths(mut self, relative: bool) -> Self {
        self.relative_paths = relative;
        self
    }
}

/// Summary of a completed flatten run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenReport {
    pub output: PathBuf,
    pub blocks: usize,
    pub bytes: u64,
    /// Blocks whose content holds a line that reads back as a tag.
    pub tag_collisions: usize,
}

/// Walks a directory and appends every matching file as a block.
#[derive(Debug, Default)]
pub struct Flattener;

impl Flattener {
    pub fn new() -> Self {
        Self
    }

    pub fn flatten(&self, options: &FlattenOptions) -> Result<FlattenReport> {
        let ignore = build_ignore_matcher(&options.ignore_globs)?;

        let file = File::create(&options.output).with_context(|| {
            format!("failed to create output file {}", options.output.display())
        })?;
        let output_identity = fs::canonicalize(&options.output).ok();
        let mut writer = BufWriter::new(file);

        let mut builder = WalkBuilder::new(&options.root);
        builder
            .standard_filters(false)
            .follow_links(options.follow_links)
            .sort_by_file_name(|a, b| a.cmp(b));

        if let Some(globs) = ignore {
            let root = options.root.clone();
            builder.filter_entry(move |entry| {
                if entry.depth() == 0 {
                    return true;
                }
                let rel = entry.path().strip_prefix(&root).unwrap_or(entry.path());
                !globs.is_match(rel)
            });
        }

        let mut report = FlattenReport {
            output: options.output.clone(),
            blocks: 0,
            bytes: 0,
            tag_collisions: 0,
        };

        for result in builder.build() {
            let entry = result
                .with_context(|| format!("failed to walk {}", options.root.display()))?;
            if entry.file_type().is_some_and(|kind| kind.is_dir()) {
                continue;
            }

            let path = entry.path();
            if !options.filter.matches(&path.to_string_lossy()) {
                continue;
            }

            if let Some(identity) = &output_identity
                && fs::canonicalize(path).ok().as_ref() == Some(identity)
            {
                tracing::debug!(path = %path.display(), "skipping the output file");
                continue;
            }

            let block = read_block(&options.root, path, options.relative_paths)?;
            let collisions = format::colliding_lines(&block.content);
            if !collisions.is_empty() {
                tracing::warn!(
                    path = %block.path,
                    lines = ?collisions,
                    "content contains tag lines and will not reconstruct intact"
                );
                report.tag_collisions += 1;
            }
            format::write_block(&mut writer, &block).with_context(|| {
                format!("failed to write to output file {}", options.output.display())
            })?;

            tracing::debug!(path = %block.path, bytes = block.content.len(), "flattened file");
            report.blocks += 1;
            report.bytes += block.content.len() as u64;
        }

        writer
            .flush()
            .with_context(|| format!("failed to flush output file {}", options.output.display()))?;
        Ok(report)
    }
}

fn read_block(root: &Path, path: &Path, relative: bool) -> Result<FileBlock> {
    let recorded = record_path(root, path, relative);
    if recorded.contains(['\n', '\r']) {
        return Err(DomainError::UnencodablePath { path: recorded }.into());
    }

    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let content = String::from_utf8(bytes).map_err(|_| DomainError::NonUtf8File {
        path: path.to_path_buf(),
    })?;
    Ok(FileBlock::new(recorded, content))
}

/// Path stored in the start tag.
///
/// The path is cleaned lexically: `.` components are dropped so `--dir .`
/// records `a/x.txt`, and `..` cancels the normal component before it.
/// Leading `..` components are kept.
fn record_path(root: &Path, path: &Path, relative: bool) -> String {
    let shown = if relative {
        match path.strip_prefix(root) {
            Ok(rel) if !rel.as_os_str().is_empty() => rel,
            _ => path.file_name().map(Path::new).unwrap_or(path),
        }
    } else {
        path
    };

    let mut cleaned: Vec<Component<'_>> = Vec::new();
    for component in shown.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match cleaned.last() {
                Some(Component::Normal(_)) => {
                    cleaned.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => cleaned.push(component),
            },
            _ => cleaned.push(component),
        }
    }
    cleaned.iter().collect::<PathBuf>().display().to_string()
}

fn build_ignore_matcher(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob =
            Glob::new(pattern).with_context(|| format!("invalid ignore glob '{pattern}'"))?;
        builder.add(glob);
    }
    let globs = builder.build().context("failed to build ignore matcher")?;
    Ok(Some(globs))
}
