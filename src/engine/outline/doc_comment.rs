//! Doc comment parsing.
//!
//! A doc comment is the run of `//` comments, or the single `/* */` comment,
//! directly above a declaration. Two tags are structured:
//!
//! ```text
//! // Rounded plate with mounting holes.
//! // @param size (positional) {number|vector} Outer dimensions
//! // @param r (named) {number} Corner radius
//! // @see https://en.wikipedia.org/wiki/Fillet_(mechanics)
//! module plate(size, r = 2) { ... }
//! ```
//!
//! Every other line, including unknown `@tags`, is kept as body text.

use crate::engine::types::{Annotation, DocComment, ParamAnnotation, ParamPassing, SeeAlsoAnnotation};

/// Strips comment markers and returns the content lines of one comment.
pub fn comment_lines(comment: &str) -> Vec<String> {
    if let Some(line) = comment.strip_prefix("//") {
        let line = line.strip_prefix('/').unwrap_or(line);
        return vec![line.strip_prefix(' ').unwrap_or(line).trim_end().to_string()];
    }

    let inner = comment
        .strip_prefix("/*")
        .and_then(|c| c.strip_suffix("*/"))
        .unwrap_or(comment);
    let inner = inner.strip_prefix('*').unwrap_or(inner);
    inner
        .lines()
        .map(|line| {
            let line = line.trim();
            let line = line.strip_prefix('*').unwrap_or(line);
            line.strip_prefix(' ').unwrap_or(line).trim_end().to_string()
        })
        .collect()
}

/// Parses cleaned comment lines into a [`DocComment`].
///
/// Returns `None` when the lines hold neither text nor annotations.
pub fn parse<'a, I>(lines: I) -> Option<DocComment>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut doc = DocComment::default();
    let mut body_lines: Vec<&str> = Vec::new();
    // Annotation whose description may continue on following lines.
    let mut open_param: Option<ParamAnnotation> = None;

    for line in lines {
        let trimmed = line.trim();

        if let Some(rest) = tag_content(trimmed, "@param") {
            flush(&mut doc, &mut open_param);
            open_param = Some(parse_param(rest));
        } else if let Some(rest) = tag_content(trimmed, "@see") {
            flush(&mut doc, &mut open_param);
            let link = rest.split_whitespace().next().unwrap_or_default();
            doc.annotations.push(Annotation::SeeAlso(SeeAlsoAnnotation {
                link: link.to_string(),
            }));
        } else if let Some(param) = open_param.as_mut().filter(|_| !trimmed.is_empty()) {
            if !param.description.is_empty() {
                param.description.push(' ');
            }
            param.description.push_str(trimmed);
        } else {
            flush(&mut doc, &mut open_param);
            body_lines.push(trimmed);
        }
    }
    flush(&mut doc, &mut open_param);

    doc.body = body_lines.join("\n").trim().to_string();
    if doc.body.is_empty() && doc.annotations.is_empty() {
        None
    } else {
        Some(doc)
    }
}

fn flush(doc: &mut DocComment, open_param: &mut Option<ParamAnnotation>) {
    if let Some(param) = open_param.take() {
        doc.annotations.push(Annotation::Param(param));
    }
}

/// Content after `tag` when the line starts with exactly that tag.
fn tag_content<'a>(line: &'a str, tag: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(tag)?;
    match rest.chars().next() {
        None => Some(""),
        Some(c) if c.is_whitespace() => Some(rest.trim_start()),
        Some(_) => None,
    }
}

fn parse_param(content: &str) -> ParamAnnotation {
    let (link, mut rest) = content
        .split_once(char::is_whitespace)
        .unwrap_or((content, ""));
    let mut passing = None;
    let mut type_tags = Vec::new();

    loop {
        rest = rest.trim_start();
        if let Some(group) = rest.strip_prefix('(').and_then(|r| r.split_once(')')) {
            passing = match group.0.trim() {
                "positional" => Some(ParamPassing::Positional),
                "named" => Some(ParamPassing::Named),
                _ => passing,
            };
            rest = group.1;
        } else if let Some(group) = rest.strip_prefix('{').and_then(|r| r.split_once('}')) {
            type_tags.extend(
                group
                    .0
                    .split('|')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string),
            );
            rest = group.1;
        } else {
            break;
        }
    }

    ParamAnnotation {
        link: link.to_string(),
        passing,
        type_tags,
        description: rest.trim().to_string(),
    }
}
