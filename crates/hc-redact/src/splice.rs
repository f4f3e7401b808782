//! Rebuild a line from substitutions located on the original text.
//!
//! All offsets refer to the untouched input line, so a replacement can never
//! be rescanned as input by a later match on the same line.

use serde::{Deserialize, Serialize};

/// How replacements of a different length affect the surrounding columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidthMode {
    /// Replacements may shift the rest of the line.
    #[default]
    Natural,
    /// Each whitespace-delimited token keeps its column width by growing or
    /// shrinking the run of blanks that follows it (fixed-width tables such
    /// as `netstat` output). At least one blank is always kept, so a
    /// longer image with too few blanks after it grows the line; images
    /// themselves are never cut.
    Preserve,
}

/// Replace `line[start..end]` with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub start: usize,
    pub end: usize,
    pub replacement: String,
}

/// Apply sorted, non-overlapping substitutions.
pub fn splice(line: &str, subs: &[Substitution], mode: WidthMode) -> String {
    let mut out = String::with_capacity(line.len() + subs.len() * 8);
    let mut last = 0;
    let mut i = 0;

    while i < subs.len() {
        match mode {
            WidthMode::Natural => {
                let sub = &subs[i];
                out.push_str(&line[last..sub.start]);
                out.push_str(&sub.replacement);
                last = sub.end;
                i += 1;
            }
            WidthMode::Preserve => {
                let token_end = token_end(line, subs[i].end);
                let mut delta: isize = 0;
                while i < subs.len() && subs[i].start < token_end {
                    let sub = &subs[i];
                    out.push_str(&line[last..sub.start]);
                    out.push_str(&sub.replacement);
                    delta += sub.replacement.len() as isize - (sub.end - sub.start) as isize;
                    last = sub.end;
                    i += 1;
                }
                out.push_str(&line[last..token_end]);
                last = token_end;

                let blank_end = line[token_end..]
                    .find(|c: char| c != ' ')
                    .map_or(line.len(), |off| token_end + off);
                let blanks = (blank_end - token_end) as isize;
                // Trailing blanks at end of line carry no column.
                if blanks > 0 && blank_end < line.len() {
                    let keep = (blanks - delta).max(1) as usize;
                    out.extend(std::iter::repeat(' ').take(keep));
                    last = blank_end;
                }
            }
        }
    }

    out.push_str(&line[last..]);
    out
}

/// End of the whitespace-delimited token containing `from`.
fn token_end(line: &str, from: usize) -> usize {
    line[from..]
        .find(char::is_whitespace)
        .map_or(line.len(), |off| from + off)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(start: usize, end: usize, replacement: &str) -> Substitution {
        Substitution {
            start,
            end,
            replacement: replacement.to_string(),
        }
    }

    #[test]
    fn test_natural_mode() {
        let line = "a 1.1.1.1 b";
        let out = splice(line, &[sub(2, 9, "10.230.230.1")], WidthMode::Natural);
        assert_eq!(out, "a 10.230.230.1 b");
    }

    #[test]
    fn test_preserve_mode_shrinks_blanks() {
        let line = "tcp 1.1.1.1:22      LISTEN";
        let out = splice(line, &[sub(4, 11, "10.230.230.1")], WidthMode::Preserve);
        assert_eq!(out, "tcp 10.230.230.1:22 LISTEN");
        assert_eq!(out.find("LISTEN"), line.find("LISTEN"));
    }

    #[test]
    fn test_preserve_mode_pads_blanks() {
        let line = "tcp 192.168.100.200:22 LISTEN";
        let out = splice(line, &[sub(4, 19, "10.230.230.1")], WidthMode::Preserve);
        assert_eq!(out, "tcp 10.230.230.1:22    LISTEN");
        assert_eq!(out.len(), line.len());
    }

    #[test]
    fn test_preserve_mode_keeps_one_blank() {
        let line = "1.1.1.1:22 X";
        let out = splice(line, &[sub(0, 7, "10.230.230.1")], WidthMode::Preserve);
        assert_eq!(out, "10.230.230.1:22 X");
    }

    #[test]
    fn test_preserve_mode_two_tokens_use_original_offsets() {
        let line = "1.1.1.1:1      22.22.22.22:2   END";
        let subs = [sub(0, 7, "10.230.230.1"), sub(15, 26, "10.230.230.2")];
        let out = splice(line, &subs, WidthMode::Preserve);
        assert_eq!(out.len(), line.len());
        assert_eq!(out, "10.230.230.1:1 10.230.230.2:2  END");
    }

    #[test]
    fn test_preserve_mode_end_of_line() {
        let line = "peer 1.1.1.1";
        let out = splice(line, &[sub(5, 12, "10.230.230.1")], WidthMode::Preserve);
        assert_eq!(out, "peer 10.230.230.1");
    }
}
