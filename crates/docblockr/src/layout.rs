//! Layout post-processing of rendered docblock lines.
//!
//! Runs after rendering: column alignment, tab-stop renumbering, section
//! spacing and snippet assembly. `rewrap` is separate and reflows the body
//! of a comment that already exists.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::{AlignTags, Spacer};

static RE_STOP_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$(?:\{\d+:|\d+)").unwrap());
static RE_TAG_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*@([A-Za-z]+)").unwrap());
static RE_COMMENT_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*(?:///|//|\*))").unwrap());
static RE_FINAL_STOP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:^|[^\\])\$(?:0|\{0:)").unwrap());

// -- Tab stops ----------------------------------------------------------------

/// Renumber every `${n:...}` and bare `$n` placeholder so the numbers run
/// from `base` upwards in reading order. `$0` keeps its meaning as the
/// final stop and escaped `\$` is left alone.
pub fn fix_tab_stops(lines: &[String], base: usize) -> Vec<String> {
    let mut next = base;
    lines.iter().map(|line| renumber(line, &mut next)).collect()
}

fn renumber(line: &str, next: &mut usize) -> String {
    let bytes = line.as_bytes();
    let mut out = String::with_capacity(line.len());
    let mut copied = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'$' => {
                let braced = bytes.get(i + 1) == Some(&b'{');
                let digits_at = if braced { i + 2 } else { i + 1 };
                let digits_end = digits_at
                    + bytes
                        .get(digits_at..)
                        .unwrap_or_default()
                        .iter()
                        .take_while(|b| b.is_ascii_digit())
                        .count();
                let well_formed = digits_end > digits_at && (!braced || bytes.get(digits_end) == Some(&b':'));
                let is_final = line[digits_at..digits_end].bytes().all(|b| b == b'0');
                if well_formed && !is_final {
                    out.push_str(&line[copied..digits_at]);
                    out.push_str(&next.to_string());
                    *next += 1;
                    copied = digits_end;
                    i = digits_end;
                } else {
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }
    out.push_str(&line[copied.min(line.len())..]);
    out
}

/// Whether the snippet already carries a final `$0` stop.
pub fn has_final_stop(snippet: &str) -> bool {
    RE_FINAL_STOP.is_match(snippet)
}

/// Width of a column once the editor has expanded it: placeholder syntax
/// and escapes do not count.
pub fn visible_width(column: &str) -> usize {
    let mut width = 0;
    let mut depth = 0usize;
    let mut rest = column;
    while let Some(c) = rest.chars().next() {
        if c == '\\' {
            let escaped = rest[1..].chars().next().map_or(0, char::len_utf8);
            width += 1;
            rest = &rest[1 + escaped..];
        } else if let Some(m) = RE_STOP_OPEN.find(rest) {
            if m.as_str().ends_with(':') {
                depth += 1;
            }
            rest = &rest[m.end()..];
        } else if c == '}' && depth > 0 {
            depth -= 1;
            rest = &rest[1..];
        } else {
            width += 1;
            rest = &rest[c.len_utf8()..];
        }
    }
    width
}

// -- Alignment ----------------------------------------------------------------

fn columns(line: &str) -> Vec<&str> {
    if line.contains('\t') {
        line.split('\t').collect()
    } else {
        line.split(' ').collect()
    }
}

/// Align the columns of tag lines (`@...`).
///
/// Columns are tab separated, or space separated on lines without tabs.
/// `@author` lines and lines starting with `exempt` keep their text and
/// only lose their tabs.
pub fn align_tags(lines: &[String], mode: AlignTags, min_gap: usize, exempt: Option<&str>) -> Vec<String> {
    let aligned = |line: &str| {
        line.starts_with('@')
            && !line.starts_with("@author")
            && exempt.map_or(true, |tag| !line.starts_with(tag))
    };
    let untabbed = |line: &str| {
        line.split('\t')
            .filter(|col| !col.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    };

    if mode == AlignTags::None {
        return lines.iter().map(|l| untabbed(l)).collect();
    }
    let limit = if mode == AlignTags::Shallow { 1 } else { usize::MAX };

    let mut max_widths: Vec<usize> = Vec::new();
    for line in lines.iter().filter(|l| aligned(l)) {
        for (j, col) in columns(line).into_iter().enumerate() {
            let w = visible_width(col);
            match max_widths.get_mut(j) {
                Some(max) => *max = (*max).max(w),
                None => max_widths.push(w),
            }
        }
    }

    let gap = " ".repeat(min_gap);
    lines
        .iter()
        .map(|line| {
            if !aligned(line) {
                return untabbed(line);
            }
            let mut out = String::new();
            for (j, col) in columns(line).into_iter().enumerate() {
                let max = max_widths.get(j).copied().unwrap_or(0);
                // an empty column only holds its place when it is padded
                if col.is_empty() && (j >= limit || max == 0) {
                    continue;
                }
                out.push_str(col);
                out.push_str(&gap);
                if j < limit {
                    out.push_str(&" ".repeat(max.saturating_sub(visible_width(col))));
                }
            }
            out.trim_end().to_string()
        })
        .collect()
}

// -- Section spacing ----------------------------------------------------------

fn tag_kind(line: &str) -> Option<&str> {
    RE_TAG_LINE.captures(line).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// Insert blank lines between sections. A blank line never opens the
/// block and never follows another blank line.
pub fn add_spacers(lines: Vec<String>, spacer: Spacer) -> Vec<String> {
    if spacer == Spacer::Never {
        return lines;
    }
    let mut out: Vec<String> = Vec::with_capacity(lines.len() + 2);
    let mut last_kind: Option<String> = None;
    let mut seen_tag = false;
    for line in lines {
        if let Some(kind) = tag_kind(&line) {
            let wanted = match spacer {
                Spacer::Always => last_kind.as_deref() != Some(kind),
                _ => !seen_tag,
            };
            let after_blank = out.last().map_or(true, |l| l.trim().is_empty());
            if wanted && !after_blank {
                out.push(String::new());
            }
            last_kind = Some(kind.to_string());
            seen_tag = true;
        }
        out.push(line);
    }
    out
}

// -- Snippet assembly ---------------------------------------------------------

/// How a block is framed in the target language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Per-line prefix, e.g. ` *` or `///`.
    pub prefix: String,
    /// Closing line; absent for languages without block comments.
    pub closer: Option<String>,
    pub indentation_spaces: usize,
    pub newline_after_block: bool,
}

/// Frame the lines into the final snippet. With no lines, an empty skeleton
/// with the final stop around `trailing` is produced.
pub fn create_snippet(lines: &[String], frame: &Frame, trailing: &str) -> String {
    let indent = " ".repeat(frame.indentation_spaces);
    let mut snippet = String::new();
    if lines.is_empty() {
        snippet.push_str(&format!("\n{}{}${{0:{}}}", frame.prefix, indent, trailing));
    }
    for line in lines {
        snippet.push('\n');
        snippet.push_str(&frame.prefix);
        if !line.is_empty() {
            snippet.push_str(&indent);
            snippet.push_str(line);
        }
    }
    if let Some(closer) = &frame.closer {
        snippet.push('\n');
        snippet.push_str(closer);
    }
    if !has_final_stop(&snippet) {
        snippet.push_str("$0");
    }
    if frame.newline_after_block {
        snippet.push('\n');
    }
    snippet
}

/// A single-line block: ` text */`.
pub fn create_inline(lines: &[String]) -> String {
    match lines.iter().find(|l| !l.trim().is_empty()) {
        Some(line) if has_final_stop(line) => format!(" {} */", line),
        Some(line) => format!(" {}$0 */", line),
        None => " $0 */".to_string(),
    }
}

// -- Reflow -------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrapOptions {
    pub width: usize,
    pub indentation_spaces: usize,
    pub spacer: Spacer,
}

struct Paragraph {
    words: Vec<String>,
    tag: Option<String>,
}

/// Reflow the body of an existing comment to `width` columns.
///
/// Every line keeps the comment prefix of the first line. Blank comment
/// lines separate paragraphs and collapse into one; a line starting with a
/// tag opens a paragraph that never merges with the line before it.
pub fn rewrap(body: &str, options: &WrapOptions) -> String {
    let prefix = body
        .lines()
        .find_map(|l| RE_COMMENT_PREFIX.captures(l))
        .and_then(|c| c.get(1))
        .map_or(" *", |m| m.as_str())
        .to_string();

    let mut paragraphs: Vec<Paragraph> = Vec::new();
    let mut open = false;
    for line in body.lines() {
        let content = RE_COMMENT_PREFIX
            .find(line)
            .map_or(line, |m| &line[m.end()..])
            .trim();
        if content.is_empty() {
            open = false;
            continue;
        }
        let tag = tag_kind(content);
        if !open || tag.is_some() {
            paragraphs.push(Paragraph {
                words: Vec::new(),
                tag: tag.map(str::to_string),
            });
            open = true;
        }
        if let Some(para) = paragraphs.last_mut() {
            para.words.extend(content.split_whitespace().map(str::to_string));
        }
    }

    let lead = format!("{}{}", prefix, " ".repeat(options.indentation_spaces));
    let mut out: Vec<String> = Vec::new();
    for (i, para) in paragraphs.iter().enumerate() {
        if i > 0 && needs_break(&paragraphs[i - 1], para, options.spacer) {
            out.push(prefix.clone());
        }
        let mut line = lead.clone();
        for word in &para.words {
            let fresh = line.len() == lead.len();
            if !fresh && line.chars().count() + 1 + word.chars().count() > options.width {
                out.push(std::mem::replace(&mut line, lead.clone()));
            }
            if line.len() > lead.len() {
                line.push(' ');
            }
            line.push_str(word);
        }
        out.push(line);
    }
    out.join("\n")
}

fn needs_break(prev: &Paragraph, next: &Paragraph, spacer: Spacer) -> bool {
    match (&prev.tag, &next.tag) {
        (_, None) => true,
        (None, Some(_)) => spacer != Spacer::Never,
        (Some(a), Some(b)) => spacer == Spacer::Always && a != b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(src: &[&str]) -> Vec<String> {
        src.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn tab_stops_renumber_in_reading_order() {
        let out = fix_tab_stops(&lines(&["${5:x} and", "${2:y} $7"]), 1);
        assert_eq!(out, ["${1:x} and", "${2:y} $3"]);
    }

    #[test]
    fn tab_stops_respect_base_and_final_stop() {
        let out = fix_tab_stops(&lines(&["${1:a} $0 ${0:end} \\$3 ${4:b}"]), 3);
        assert_eq!(out, ["${3:a} $0 ${0:end} \\$3 ${4:b}"]);
    }

    #[test]
    fn tab_stops_renumber_nested_placeholders() {
        let out = fix_tab_stops(&lines(&["${9:outer ${9:inner}}"]), 1);
        assert_eq!(out, ["${1:outer ${2:inner}}"]);
    }

    #[test]
    fn width_ignores_placeholder_syntax() {
        assert_eq!(visible_width("${1:foo}"), 3);
        assert_eq!(visible_width("{${1:[type]}}"), 8);
        assert_eq!(visible_width("\\$foo"), 4);
        assert_eq!(visible_width("$1"), 0);
    }

    #[test]
    fn deep_alignment_pads_every_column() {
        let out = align_tags(&lines(&["@param\tfoo\tstr", "@param\tlongname\tint"]), AlignTags::Deep, 1, None);
        assert_eq!(out, ["@param foo      str", "@param longname int"]);
    }

    #[test]
    fn shallow_alignment_pads_first_column_only() {
        let out = align_tags(
            &lines(&["@param\tfoo\tstr", "@return\tlongname\tint"]),
            AlignTags::Shallow,
            1,
            None,
        );
        assert_eq!(out, ["@param  foo str", "@return longname int"]);
    }

    #[test]
    fn alignment_measures_visible_text() {
        let out = align_tags(
            &lines(&["@param\t${1:a}\tx", "@param\tabc\ty"]),
            AlignTags::Deep,
            2,
            None,
        );
        assert_eq!(out, ["@param  ${1:a}    x", "@param  abc  y"]);
    }

    #[test]
    fn author_and_exempt_lines_are_not_aligned() {
        let out = align_tags(
            &lines(&["@author\tJane Doe", "@param\tlongname\tint", "@return\tx", "text\twith tab"]),
            AlignTags::Deep,
            1,
            Some("@return"),
        );
        assert_eq!(out, ["@author Jane Doe", "@param longname int", "@return x", "text with tab"]);
    }

    #[test]
    fn empty_column_lines_up_later_columns() {
        let out = align_tags(
            &lines(&["@param	Type	name	desc", "@return	Type		desc"]),
            AlignTags::Deep,
            1,
            None,
        );
        assert_eq!(out, ["@param  Type name desc", "@return Type      desc"]);
        let out = align_tags(&lines(&["@return	Type		desc"]), AlignTags::Deep, 1, None);
        assert_eq!(out, ["@return Type desc"]);
        let out = align_tags(&lines(&["@return	Type		desc"]), AlignTags::None, 1, None);
        assert_eq!(out, ["@return Type desc"]);
    }

    #[test]
    fn none_mode_only_untabs() {
        let out = align_tags(&lines(&["@param\ta\tb"]), AlignTags::None, 3, None);
        assert_eq!(out, ["@param a b"]);
    }

    #[test]
    fn spacer_after_description() {
        let out = add_spacers(lines(&["desc", "@param a", "@param b", "@return c"]), Spacer::AfterDescription);
        assert_eq!(out, ["desc", "", "@param a", "@param b", "@return c"]);
    }

    #[test]
    fn spacer_always_splits_tag_kinds() {
        let out = add_spacers(lines(&["desc", "@param a", "@param b", "@return c"]), Spacer::Always);
        assert_eq!(out, ["desc", "", "@param a", "@param b", "", "@return c"]);
    }

    #[test]
    fn spacer_never_opens_block_or_doubles() {
        let out = add_spacers(lines(&["@param a", "", "@return c"]), Spacer::Always);
        assert_eq!(out, ["@param a", "", "@return c"]);
    }

    #[test]
    fn snippet_frames_lines() {
        let frame = Frame {
            prefix: " *".into(),
            closer: Some(" */".into()),
            indentation_spaces: 1,
            newline_after_block: false,
        };
        let out = create_snippet(&lines(&["${1:desc}", "", "@return x"]), &frame, "");
        assert_eq!(out, "\n * ${1:desc}\n *\n * @return x\n */$0");
    }

    #[test]
    fn empty_snippet_is_skeleton() {
        let frame = Frame {
            prefix: " *".into(),
            closer: Some(" */".into()),
            indentation_spaces: 1,
            newline_after_block: true,
        };
        assert_eq!(create_snippet(&[], &frame, "note"), "\n * ${0:note}\n */\n");
    }

    #[test]
    fn inline_block() {
        assert_eq!(create_inline(&lines(&["${1:[type]}"])), " ${1:[type]}$0 */");
        assert_eq!(create_inline(&[]), " $0 */");
    }

    #[test]
    fn rewrap_merges_and_wraps() {
        let body = " * one two\n * three four five\n *\n *\n * six\n * @param a the\n *   first";
        let opts = WrapOptions {
            width: 16,
            indentation_spaces: 1,
            spacer: Spacer::AfterDescription,
        };
        assert_eq!(
            rewrap(body, &opts),
            " * one two three\n * four five\n *\n * six\n *\n * @param a the\n * first"
        );
    }

    #[test]
    fn rewrap_keeps_tags_apart() {
        let body = "/// @param a x\n/// @param b y\n/// @return z";
        let opts = WrapOptions {
            width: 80,
            indentation_spaces: 1,
            spacer: Spacer::Always,
        };
        assert_eq!(rewrap(body, &opts), "/// @param a x\n/// @param b y\n///\n/// @return z");
    }
}
