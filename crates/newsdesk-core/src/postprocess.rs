//! String passes applied to renderer output.
//!
//! The HTML renderer produces a flat string in which sibling boundaries are
//! marked with [`SEPARATOR`] and source line breaks with `<br />`. The
//! passes here run on that string:
//!
//! - [`promote_headings`] turns `# ` / `## ` lines into heading blocks and
//!   deletes the separator.
//! - [`minify_whitespace`] collapses whitespace runs outside `<pre>`.
//! - [`escape_html`] is for values that never went through the renderer.

use crate::render::SEPARATOR;

/// Line break emitted by the HTML renderer for `br` nodes.
pub const LINE_BREAK: &str = "<br />";

/// Elements the renderer emits without a closing tag.
const VOID_ELEMENTS: [&str; 2] = ["br", "img"];

/// Escape `& < > " '` for interpolation into HTML text or attributes.
///
/// Must not be applied to HTML renderer output, which is already escaped.
pub fn escape_html(unsafe_text: &str) -> String {
    let mut escaped = String::with_capacity(unsafe_text.len());
    for c in unsafe_text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// How a rendered line is promoted.
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Heading(u8, &'a str),
    Sub(&'a str),
    Plain,
}

/// Strip a heading marker (`#`, `##`, `-`) followed by one whitespace char.
fn strip_marker<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(marker)?;
    let mut chars = rest.chars();
    if !chars.next()?.is_whitespace() {
        return None;
    }
    let body = chars.as_str().trim_end_matches(is_filler);
    // A nested break would leave the heading tag inside an open element.
    (!body.trim_start_matches(is_filler).is_empty() && !body.contains(LINE_BREAK))
        .then_some(body)
}

fn is_filler(c: char) -> bool {
    c == SEPARATOR || c.is_whitespace()
}

fn heading_level(line: &str) -> Option<(u8, &str)> {
    let normalized = line.trim_start_matches(is_filler);
    // `##` first so the single-hash marker never claims part of a `##` line.
    if let Some(body) = strip_marker(normalized, "##") {
        return Some((2, body));
    }
    strip_marker(normalized, "#").map(|body| (1, body))
}

fn classify<'a>(line: &'a str, next: Option<&&str>) -> Line<'a> {
    if let Some((level, body)) = heading_level(line) {
        return Line::Heading(level, body);
    }
    let normalized = line.trim_start_matches(is_filler);
    if let Some(body) = strip_marker(normalized, "-")
        && next.is_some_and(|n| heading_level(n).is_some())
    {
        return Line::Sub(body);
    }
    Line::Plain
}

fn is_void(tag: &str) -> bool {
    let name = tag
        .trim_start_matches('<')
        .split(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .next()
        .unwrap_or_default();
    tag.ends_with("/>") || VOID_ELEMENTS.contains(&name)
}

/// Split renderer output at `<br />` tags outside any element.
///
/// Text and attribute values are escaped, so every `<` opens a tag.
fn split_lines(html: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut cursor = 0;

    while let Some(offset) = html[cursor..].find('<') {
        let at = cursor + offset;
        let rest = &html[at..];
        if depth == 0 && rest.starts_with(LINE_BREAK) {
            lines.push(&html[start..at]);
            start = at + LINE_BREAK.len();
            cursor = start;
            continue;
        }
        let end = rest.find('>').map_or(html.len(), |close| at + close + 1);
        let tag = &html[at..end];
        if tag.starts_with("</") {
            depth = depth.saturating_sub(1);
        } else if !is_void(tag) {
            depth += 1;
        }
        cursor = end;
    }
    lines.push(&html[start..]);
    lines
}

/// Promote `# ` / `## ` lines to `<h1>` / `<h2>` and `- ` kicker lines
/// directly above a heading to `<span class="sub">`.
///
/// Lines are the segments between top-level `<br />` tags; breaks nested in
/// inline markup or quotes stay inside their line, and a marked line holding
/// one is left as plain text. Leading sibling separators and whitespace are
/// ignored when looking for a marker. The line break following a promoted
/// line is dropped. All separators are removed from the result.
pub fn promote_headings(html: &str) -> String {
    let lines = split_lines(html);
    let mut out = String::with_capacity(html.len());
    let mut previous_plain = false;

    for (i, line) in lines.iter().enumerate() {
        let promoted = classify(line, lines.get(i + 1));
        if previous_plain {
            out.push_str(LINE_BREAK);
        }
        previous_plain = false;
        match promoted {
            Line::Heading(level, body) => {
                out.push_str(&format!("<h{level}>{body}</h{level}>"));
            }
            Line::Sub(body) => {
                out.push_str(&format!("<span class=\"sub\">{body}</span>"));
            }
            Line::Plain => {
                out.push_str(line);
                previous_plain = true;
            }
        }
    }

    strip_separators(&out)
}

/// Delete every sibling separator.
pub fn strip_separators(html: &str) -> String {
    html.chars().filter(|&c| c != SEPARATOR).collect()
}

/// Collapse runs of whitespace to a single space outside `<pre>` blocks and
/// trim both ends.
pub fn minify_whitespace(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut pre_depth = 0usize;
    let mut in_run = false;

    for (i, c) in html.char_indices() {
        if c == '<' {
            let rest = &html[i..];
            if rest.starts_with("<pre") {
                pre_depth += 1;
            } else if rest.starts_with("</pre>") {
                pre_depth = pre_depth.saturating_sub(1);
            }
        }
        if pre_depth == 0 && c.is_whitespace() {
            if !in_run {
                out.push(' ');
                in_run = true;
            }
            continue;
        }
        in_run = false;
        out.push(c);
    }

    out.trim().to_string()
}

/// First `# ` line of a plaintext rendering, used as a post title.
pub fn heading_title(plain: &str) -> Option<String> {
    plain.lines().find_map(|line| {
        let body = line.trim_start().strip_prefix("# ")?.trim();
        (!body.is_empty()).then(|| body.to_string())
    })
}

/// Wrap a fragment in a CDATA section, splitting any embedded terminator.
pub fn cdata(fragment: &str) -> String {
    format!(
        "<![CDATA[{}]]>",
        fragment.replace("]]>", "]]]]><![CDATA[>")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const S: char = SEPARATOR;

    #[test]
    fn escape_all_five() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#039;s&lt;/a&gt;"
        );
    }

    #[test]
    fn escape_is_not_idempotent() {
        assert_eq!(escape_html(&escape_html("&")), "&amp;amp;");
    }

    #[test]
    fn promote_single_hash() {
        assert_eq!(promote_headings("# Title"), "<h1>Title</h1>");
    }

    #[test]
    fn promote_double_hash_before_single() {
        let html = promote_headings("## Title");
        assert_eq!(html, "<h2>Title</h2>");
        assert!(!html.contains("<h1>"));
    }

    #[test]
    fn triple_hash_is_left_alone() {
        assert_eq!(promote_headings("### Title"), "### Title");
    }

    #[test]
    fn hash_without_space_is_left_alone() {
        assert_eq!(promote_headings("#hashtag"), "#hashtag");
        assert_eq!(promote_headings("# "), "# ");
    }

    #[test]
    fn heading_spans_sibling_separators() {
        let html = format!("# Big {S}<b>news</b>{S} today{S}<br />{S}body");
        assert_eq!(
            promote_headings(&html),
            "<h1>Big <b>news</b> today</h1>body"
        );
    }

    #[test]
    fn heading_after_line_break() {
        let html = format!("intro{S}<br />{S}## Section{S}<br />{S}text");
        assert_eq!(
            promote_headings(&html),
            "intro<br /><h2>Section</h2>text"
        );
    }

    #[test]
    fn mid_line_hash_is_not_heading() {
        let html = format!("<b>bold</b>{S} # not a heading");
        assert_eq!(promote_headings(&html), "<b>bold</b> # not a heading");
    }

    #[test]
    fn sub_label_above_heading() {
        let html = format!("- Breaking{S}<br />{S}# Storm hits coast{S}<br />{S}Details");
        assert_eq!(
            promote_headings(&html),
            "<span class=\"sub\">Breaking</span><h1>Storm hits coast</h1>Details"
        );
    }

    #[test]
    fn dash_line_without_heading_stays() {
        let html = format!("- item{S}<br />{S}plain");
        assert_eq!(promote_headings(&html), "- item<br />plain");
    }

    #[test]
    fn nested_break_does_not_end_heading_line() {
        let html = format!("# Big {S}<b>a{S}<br />{S}b</b>");
        assert_eq!(promote_headings(&html), "# Big <b>a<br />b</b>");
    }

    #[test]
    fn heading_after_nested_break() {
        let html = format!(
            "<blockquote>q{S}<br />{S}r</blockquote>{S}<br />{S}# Title{S}<br />{S}text"
        );
        assert_eq!(
            promote_headings(&html),
            "<blockquote>q<br />r</blockquote><br /><h1>Title</h1>text"
        );
    }

    #[test]
    fn void_images_keep_depth() {
        let html = format!("<img class=\"emoji\" src=\"x\" alt=\":a:\">{S}<br />{S}## Next");
        assert_eq!(
            promote_headings(&html),
            "<img class=\"emoji\" src=\"x\" alt=\":a:\"><br /><h2>Next</h2>"
        );
    }

    #[test]
    fn separators_removed_everywhere() {
        let html = format!("a{S}b{S}<br />{S}c");
        let out = promote_headings(&html);
        assert!(!out.contains(S));
        assert_eq!(out, "ab<br />c");
    }

    #[test]
    fn minify_collapses_runs() {
        assert_eq!(minify_whitespace("  a \n\t b  "), "a b");
    }

    #[test]
    fn minify_preserves_pre() {
        assert_eq!(
            minify_whitespace("x   <pre><code>a\n    b</code></pre>   y"),
            "x <pre><code>a\n    b</code></pre> y"
        );
    }

    #[test]
    fn heading_title_first_match() {
        assert_eq!(
            heading_title("intro\n# First\n# Second"),
            Some("First".to_string())
        );
        assert_eq!(heading_title("## Sub only"), None);
        assert_eq!(heading_title("no heading"), None);
    }

    #[test]
    fn cdata_splits_terminator() {
        assert_eq!(cdata("a]]>b"), "<![CDATA[a]]]]><![CDATA[>b]]>");
    }
}
