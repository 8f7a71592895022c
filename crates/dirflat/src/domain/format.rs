//! Tagged-block text format shared by the flattener and the reconstructor.
//!
//! A flat file is a sequence of blocks:
//!
//! ```text
//! <FILE path=src/main.go>
//! package main
//! </FILE>
//! ```
//!
//! The path is the literal remainder of the start line up to its final `>`
//! and is never escaped. Content lines are stored verbatim, so a content line
//! that itself looks like a start tag is read back as the start of a new
//! block. Flat files that rely on that behavior keep round-tripping the same
//! way, which is why it is left alone.

use std::io::{self, Write};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::model::FileBlock;

pub const START_TAG_PREFIX: &str = "<FILE path=";
pub const START_TAG_SUFFIX: &str = ">";
pub const END_TAG: &str = "</FILE>";

static START_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        "^{}(.*){}$",
        regex::escape(START_TAG_PREFIX),
        regex::escape(START_TAG_SUFFIX)
    ))
    .expect("start tag pattern is valid")
});

/// Classification of a single line of a flat file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    /// `<FILE path=...>` carrying the captured path.
    Start(&'a str),
    /// `</FILE>`, surrounding whitespace allowed.
    End,
    Content(&'a str),
}

impl<'a> Line<'a> {
    /// Classify a line with its terminator already removed.
    pub fn classify(line: &'a str) -> Self {
        if let Some(captures) = START_TAG.captures(line)
            && let Some(path) = captures.get(1)
        {
            return Line::Start(path.as_str());
        }
        if line.trim() == END_TAG {
            return Line::End;
        }
        Line::Content(line)
    }
}

/// 1-based numbers of content lines that would be read back as a tag.
///
/// Such lines split or cut short the block on reconstruction.
pub fn colliding_lines(content: &str) -> Vec<usize> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !matches!(Line::classify(line), Line::Content(_)))
        .map(|(index, _)| index + 1)
        .collect()
}

/// Render the start line for `path`, without its terminator.
pub fn start_tag(path: &str) -> String {
    format!("{START_TAG_PREFIX}{path}{START_TAG_SUFFIX}")
}

/// Append one encoded block to `writer`.
///
/// Content is terminated with a newline only when it lacks one, so the end
/// tag always sits on its own line.
pub fn write_block<W: Write>(writer: &mut W, block: &FileBlock) -> io::Result<()> {
    writeln!(writer, "{}", start_tag(&block.path))?;
    writer.write_all(block.content.as_bytes())?;
    if !block.content.is_empty() && !block.content.ends_with('\n') {
        writer.write_all(b"\n")?;
    }
    writeln!(writer, "{END_TAG}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(block: &FileBlock) -> String {
        let mut buf = Vec::new();
        write_block(&mut buf, block).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn classifies_start_end_and_content() {
        assert_eq!(Line::classify("<FILE path=a/x.txt>"), Line::Start("a/x.txt"));
        assert_eq!(Line::classify("</FILE>"), Line::End);
        assert_eq!(Line::classify("  </FILE>\t"), Line::End);
        assert_eq!(Line::classify("hello"), Line::Content("hello"));
    }

    #[test]
    fn start_tag_must_span_the_whole_line() {
        assert_eq!(
            Line::classify(" <FILE path=a.txt>"),
            Line::Content(" <FILE path=a.txt>")
        );
        assert_eq!(
            Line::classify("<FILE path=a.txt> trailing"),
            Line::Content("<FILE path=a.txt> trailing")
        );
        assert_eq!(Line::classify("</FILE> x"), Line::Content("</FILE> x"));
    }

    #[test]
    fn path_runs_to_the_final_angle_bracket() {
        assert_eq!(Line::classify("<FILE path=a>b.txt>"), Line::Start("a>b.txt"));
        assert_eq!(Line::classify("<FILE path=>"), Line::Start(""));
        assert_eq!(
            Line::classify("<FILE path=dir with space/f.txt>"),
            Line::Start("dir with space/f.txt")
        );
    }

    #[test]
    fn finds_content_lines_that_read_as_tags() {
        assert_eq!(colliding_lines("before\n</FILE>\nafter\n"), vec![2]);
        assert_eq!(
            colliding_lines("<FILE path=x.txt>\nbody\r\n  </FILE>\r\n"),
            vec![1, 3]
        );
        assert!(colliding_lines("plain\n <FILE path=x> indented\n").is_empty());
        assert!(colliding_lines("").is_empty());
    }

    #[test]
    fn encodes_block_with_added_newline() {
        let encoded = encode(&FileBlock::new("a/x.txt", "hello"));
        assert_eq!(encoded, "<FILE path=a/x.txt>\nhello\n</FILE>\n");
    }

    #[test]
    fn keeps_existing_trailing_newline() {
        let encoded = encode(&FileBlock::new("x.txt", "one\ntwo\n"));
        assert_eq!(encoded, "<FILE path=x.txt>\none\ntwo\n</FILE>\n");
    }

    #[test]
    fn empty_content_has_no_body_lines() {
        let encoded = encode(&FileBlock::new("empty.txt", ""));
        assert_eq!(encoded, "<FILE path=empty.txt>\n</FILE>\n");
    }
}
