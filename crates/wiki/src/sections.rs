//! Splitting of plain-text extracts into titled sections.

use crate::types::WikiSection;

pub const INTRO_SECTION_TITLE: &str = "Introduction";

/// Split a plain-text extract on heading lines (`== X ==`, `=== X ===`, ...).
///
/// Text before the first heading becomes the intro section. Sections whose
/// body is blank are dropped, so a heading directly followed by a
/// sub-heading does not produce an empty entry.
pub fn split_sections(content: &str) -> Vec<WikiSection> {
    let mut sections = Vec::new();
    let mut title = INTRO_SECTION_TITLE.to_string();
    let mut body: Vec<&str> = Vec::new();

    for line in content.lines() {
        if let Some(heading) = heading_title(line) {
            push_section(&mut sections, &title, &body);
            title = heading.to_string();
            body.clear();
        } else {
            body.push(line);
        }
    }
    push_section(&mut sections, &title, &body);

    sections
}

fn push_section(sections: &mut Vec<WikiSection>, title: &str, body: &[&str]) {
    let content = body.join("\n").trim().to_string();
    if !content.is_empty() {
        sections.push(WikiSection {
            title: title.to_string(),
            content,
        });
    }
}

fn heading_title(line: &str) -> Option<&str> {
    let line = line.trim();
    if !(line.starts_with("==") && line.ends_with("==")) {
        return None;
    }
    let inner = line.trim_matches('=').trim();
    if inner.is_empty() { None } else { Some(inner) }
}
