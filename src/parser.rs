use crate::cue::{Cue, CueSequence};
use crate::error::ParseIssue;
use crate::time::{parse_timestamp, to_canonical_time_string, TimeFormat};

use log::{debug, trace};
use nom::bytes::complete::tag;
use nom::combinator::opt;
use nom::error::VerboseError;
use nom::IResult;
use regex::Regex;

const SRT_ARROW: &str = "-->";
const SRT_SEPARATOR: &str = " --> ";
const BRACKETED_LINE: &str = r"\[((?:[0-9]{2}:)?[0-9]{2}:[0-9]{2}\.[0-9]{3}) -> ((?:[0-9]{2}:)?[0-9]{2}:[0-9]{2}\.[0-9]{3})\] (.+)$";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    /// Numbered blocks with a `START --> END` timing line.
    Srt,
    /// One `[START -> END] text` cue per line.
    Bracketed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSubtitles {
    pub format: SubtitleFormat,
    pub cues: CueSequence,
    pub issues: Vec<ParseIssue>,
}

impl ParsedSubtitles {
    /// Number of blocks or lines that produced no cue.
    pub fn skipped(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| !matches!(i, ParseIssue::MalformedTimestamp { .. }))
            .count()
    }
}

pub struct Parser {
    bracketed_line: Regex,
}

impl Parser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            bracketed_line: Regex::new(BRACKETED_LINE)?,
        })
    }

    /// Parses a whole subtitle file. Never fails: anything unusable is left
    /// out of `cues` and described in `issues`.
    pub fn parse_subtitles(&self, raw: &str) -> ParsedSubtitles {
        let (content, first_line) = normalise(raw);
        let format = detect_format(&content);
        debug!("Detected {:?} subtitles ({} bytes)", format, content.len());

        let mut issues = Vec::new();
        let cues = match format {
            SubtitleFormat::Srt => parse_srt(&content, &mut issues),
            SubtitleFormat::Bracketed => self.parse_bracketed(&content, first_line, &mut issues),
        };
        for issue in &issues {
            trace!("{}", issue);
        }

        ParsedSubtitles {
            format,
            cues,
            issues,
        }
    }

    /// `first_line` is the 1-based source line `content` starts at.
    fn parse_bracketed(
        &self,
        content: &str,
        first_line: usize,
        issues: &mut Vec<ParseIssue>,
    ) -> CueSequence {
        let mut cues = Vec::new();
        for (idx, line) in content.split('\n').enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match self.bracketed_cue(line, first_line + idx, issues) {
                Ok(cue) => cues.push(cue),
                Err(issue) => issues.push(issue),
            }
        }
        cues
    }

    fn bracketed_cue(
        &self,
        line: &str,
        entry: usize,
        issues: &mut Vec<ParseIssue>,
    ) -> Result<Cue, ParseIssue> {
        let caps = self
            .bracketed_line
            .captures(line)
            .ok_or_else(|| ParseIssue::UnmatchedLine {
                entry,
                text: line.to_string(),
            })?;
        let start = to_canonical_time_string(&caps[1], TimeFormat::Bracketed);
        let end = to_canonical_time_string(&caps[2], TimeFormat::Bracketed);

        Ok(Cue {
            start: time_or_zero(&start, entry, issues),
            end: time_or_zero(&end, entry, issues),
            text: caps[3].to_string(),
        })
    }
}

/// Anything mentioning `-->` is treated as SRT, everything else as bracketed.
pub fn detect_format(content: &str) -> SubtitleFormat {
    if content.contains(SRT_ARROW) {
        SubtitleFormat::Srt
    } else {
        SubtitleFormat::Bracketed
    }
}

fn optional_bom(input: &str) -> IResult<&str, Option<&str>, VerboseError<&str>> {
    opt(tag("\u{FEFF}"))(input)
}

/// Strips the BOM, unifies line endings and trims. Also returns the 1-based
/// source line the trimmed text starts at.
fn normalise(raw: &str) -> (String, usize) {
    let content = match optional_bom(raw) {
        Ok((rest, _)) => rest,
        Err(_) => raw,
    };
    let content = content.replace("\r\n", "\n");
    let body = content.trim_start();
    let first_line = content[..content.len() - body.len()].matches('\n').count() + 1;
    (body.trim_end().to_string(), first_line)
}

fn parse_srt(content: &str, issues: &mut Vec<ParseIssue>) -> CueSequence {
    let mut cues = Vec::new();
    for (idx, block) in content.split("\n\n").enumerate() {
        let block = block.trim_start_matches('\n');
        if block.trim().is_empty() {
            continue;
        }
        match srt_cue(block, idx + 1, issues) {
            Ok(cue) => cues.push(cue),
            Err(issue) => issues.push(issue),
        }
    }
    cues
}

fn srt_cue(block: &str, entry: usize, issues: &mut Vec<ParseIssue>) -> Result<Cue, ParseIssue> {
    let mut lines = block.split('\n');
    // The sequence number is not used; position in the file is what counts.
    let _label = lines.next();
    let timing = lines.next().ok_or_else(|| ParseIssue::MissingTimingLine {
        entry,
        text: block.to_string(),
    })?;

    let mut parts = timing.split(SRT_SEPARATOR);
    let (start, end) = match (parts.next(), parts.next()) {
        (Some(start), Some(end)) => (start, end),
        _ => {
            return Err(ParseIssue::MissingSeparator {
                entry,
                text: timing.to_string(),
            })
        }
    };
    let start = to_canonical_time_string(start, TimeFormat::Srt);
    let end = to_canonical_time_string(end, TimeFormat::Srt);

    Ok(Cue {
        start: time_or_zero(&start, entry, issues),
        end: time_or_zero(&end, entry, issues),
        text: lines.collect::<Vec<_>>().join("\n"),
    })
}

fn time_or_zero(ts: &str, entry: usize, issues: &mut Vec<ParseIssue>) -> f64 {
    match parse_timestamp(ts) {
        Ok(secs) => secs,
        Err(issue) => {
            issues.push(issue.with_entry(entry));
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> ParsedSubtitles {
        Parser::new().unwrap().parse_subtitles(raw)
    }

    fn cue(start: f64, end: f64, text: &str) -> Cue {
        Cue {
            start,
            end,
            text: text.to_string(),
        }
    }

    #[test]
    fn parses_srt_blocks() {
        let parsed =
            parse("1\n00:00:01,000 --> 00:00:04,000\nHello\n\n2\n00:00:05,000 --> 00:00:06,500\nWorld");

        assert_eq!(parsed.format, SubtitleFormat::Srt);
        assert_eq!(
            parsed.cues,
            vec![cue(1.0, 4.0, "Hello"), cue(5.0, 6.5, "World")]
        );
        assert!(parsed.issues.is_empty());
    }

    #[test]
    fn keeps_multi_line_srt_text() {
        let parsed = parse("7\n00:01:00,000 --> 00:01:02,250\nfirst line\nsecond line\n");

        assert_eq!(parsed.cues, vec![cue(60.0, 62.25, "first line\nsecond line")]);
    }

    #[test]
    fn handles_crlf_and_bom() {
        let parsed = parse(
            "\u{FEFF}1\r\n00:00:01,000 --> 00:00:04,000\r\nHello\r\n\r\n2\r\n00:00:05,000 --> 00:00:06,500\r\nWorld\r\n",
        );

        assert_eq!(
            parsed.cues,
            vec![cue(1.0, 4.0, "Hello"), cue(5.0, 6.5, "World")]
        );
    }

    #[test]
    fn drops_block_without_timing_line() {
        let parsed = parse(
            "1\n00:00:01,000 --> 00:00:02,000\nA\n\norphan\n\n3\n00:00:03,000 --> 00:00:04,000\nC",
        );

        assert_eq!(parsed.cues, vec![cue(1.0, 2.0, "A"), cue(3.0, 4.0, "C")]);
        assert_eq!(
            parsed.issues,
            vec![ParseIssue::MissingTimingLine {
                entry: 2,
                text: "orphan".to_string()
            }]
        );
        assert_eq!(parsed.skipped(), 1);
    }

    #[test]
    fn drops_block_without_separator() {
        let parsed = parse("1\n00:00:01,000-->00:00:02,000\nA\n\n2\n00:00:03,000 --> 00:00:04,000\nB");

        assert_eq!(parsed.cues, vec![cue(3.0, 4.0, "B")]);
        assert_eq!(parsed.issues.len(), 1);
        assert_eq!(parsed.issues[0].entry(), 1);
    }

    #[test]
    fn malformed_srt_timestamp_becomes_zero() {
        let parsed = parse("1\n0:00:01,000 --> 00:00:02,000\nA");

        assert_eq!(parsed.cues, vec![cue(0.0, 2.0, "A")]);
        assert_eq!(
            parsed.issues,
            vec![ParseIssue::MalformedTimestamp {
                entry: 1,
                text: "0:00:01,000".to_string()
            }]
        );
        assert_eq!(parsed.skipped(), 0);
    }

    #[test]
    fn extra_blank_lines_between_blocks() {
        let parsed = parse(
            "1\n00:00:01,000 --> 00:00:02,000\nA\n\n\n\n\n2\n00:00:03,000 --> 00:00:04,000\nB",
        );

        assert_eq!(parsed.cues, vec![cue(1.0, 2.0, "A"), cue(3.0, 4.0, "B")]);
        assert!(parsed.issues.is_empty());
    }

    #[test]
    fn srt_order_is_not_sorted() {
        let parsed = parse(
            "1\n00:00:05,000 --> 00:00:06,000\nlate\n\n2\n00:00:01,000 --> 00:00:02,000\nearly",
        );

        assert_eq!(parsed.cues, vec![cue(5.0, 6.0, "late"), cue(1.0, 2.0, "early")]);
    }

    #[test]
    fn parses_bracketed_without_hours() {
        let parsed = parse("[00:01.000 -> 00:04.000] Hello");

        assert_eq!(parsed.format, SubtitleFormat::Bracketed);
        assert_eq!(parsed.cues, vec![cue(1.0, 4.0, "Hello")]);
    }

    #[test]
    fn parses_bracketed_with_hours() {
        let parsed = parse("[00:00:01.000 -> 00:00:04.000] Hello");

        assert_eq!(parsed.cues, vec![cue(1.0, 4.0, "Hello")]);
    }

    #[test]
    fn skips_unmatched_bracketed_lines() {
        let parsed = parse(
            "[00:00.000 -> 00:02.500] first\nnoise\n\n[01:02.000 -> 01:03.000] second\n[00:03.000 - 00:04.000] broken",
        );

        assert_eq!(
            parsed.cues,
            vec![cue(0.0, 2.5, "first"), cue(62.0, 63.0, "second")]
        );
        assert_eq!(parsed.skipped(), 2);
        assert_eq!(parsed.issues[0].entry(), 2);
        assert_eq!(parsed.issues[1].entry(), 5);
    }

    #[test]
    fn accepts_text_before_bracket() {
        let parsed = parse("1 [00:01.000 -> 00:02.000] Hi");

        assert_eq!(parsed.cues, vec![cue(1.0, 2.0, "Hi")]);
        assert!(parsed.issues.is_empty());
    }

    #[test]
    fn bracketed_issues_use_source_line_numbers() {
        let parsed = parse("\n\n  \r\n[00:01.000 -> 00:02.000] a\nnoise\n");

        assert_eq!(parsed.cues, vec![cue(1.0, 2.0, "a")]);
        assert_eq!(
            parsed.issues,
            vec![ParseIssue::UnmatchedLine {
                entry: 5,
                text: "noise".to_string()
            }]
        );
    }

    #[test]
    fn unknown_format_yields_nothing() {
        let parsed = parse("just some prose\nwith no timing at all");

        assert_eq!(parsed.format, SubtitleFormat::Bracketed);
        assert!(parsed.cues.is_empty());
        assert_eq!(parsed.skipped(), 2);
    }

    #[test]
    fn empty_input() {
        let parsed = parse("  \n\n ");

        assert!(parsed.cues.is_empty());
        assert!(parsed.issues.is_empty());
    }

    #[test]
    fn reparsing_is_idempotent() {
        let raw = "1\n00:00:01,000 --> 00:00:04,000\nHello\n\nbad\n\n2\n00:00:05,000 --> 00:00:06,500\nWorld";
        let parser = Parser::new().unwrap();

        assert_eq!(parser.parse_subtitles(raw), parser.parse_subtitles(raw));
    }

    #[test]
    fn detects_format_by_arrow() {
        assert_eq!(detect_format("a --> b"), SubtitleFormat::Srt);
        assert_eq!(detect_format("a-->b"), SubtitleFormat::Srt);
        assert_eq!(detect_format("[00:01.000 -> 00:02.000] x"), SubtitleFormat::Bracketed);
    }
}
