// Chapter segmentation using an ordered table of heading patterns.
use once_cell::sync::Lazy;
use regex::Regex;

/// A chapter-like division of the document. `title` is `None` for the
/// preamble and for documents without any heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: Option<String>,
    pub body: String,
}

struct HeadingPattern {
    name: &'static str,
    regex: Regex,
}

// Tried in order. A heading is marker + number (ASCII or Devanagari digits)
// followed by a delimiter or the end of the line.
static HEADING_PATTERNS: Lazy<Vec<HeadingPattern>> = Lazy::new(|| {
    vec![
        HeadingPattern {
            name: "devanagari",
            regex: Regex::new(r"^\s*अध्याय\s*[0-9०-९]+\s*(?:[:\-–—.।)]|$)").unwrap(),
        },
        HeadingPattern {
            name: "latin",
            regex: Regex::new(r"(?i)^\s*chapter\s*[0-9०-९]+\s*(?:[:\-–—.।)]|$)").unwrap(),
        },
    ]
});

/// Returns the section title when `line` is a chapter heading.
pub fn match_heading(line: &str) -> Option<String> {
    let line = line.trim_end_matches(['\n', '\r']);
    HEADING_PATTERNS.iter().find_map(|pattern| {
        if pattern.regex.is_match(line) {
            tracing::trace!(style = pattern.name, line, "heading matched");
            Some(line.trim().to_string())
        } else {
            None
        }
    })
}

/// Splits a document into sections at heading lines.
///
/// Heading lines are removed from the bodies; everything else is kept byte for
/// byte. Non-blank text before the first heading becomes an untitled preamble
/// section, a blank preamble is dropped. Without any heading the whole text is
/// returned as a single untitled section.
pub fn split_sections(text: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut title: Option<String> = None;
    let mut body = String::new();
    let mut seen_heading = false;

    for line in text.split_inclusive('\n') {
        match match_heading(line) {
            Some(heading) => {
                push_section(&mut sections, title.take(), std::mem::take(&mut body));
                title = Some(heading);
                seen_heading = true;
            }
            None => body.push_str(line),
        }
    }

    if !seen_heading {
        return vec![Section {
            title: None,
            body: text.to_string(),
        }];
    }

    push_section(&mut sections, title, body);
    sections
}

fn push_section(sections: &mut Vec<Section>, title: Option<String>, body: String) {
    if title.is_none() && body.trim().is_empty() {
        return;
    }
    sections.push(Section { title, body });
}
