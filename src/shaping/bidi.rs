//! Visual reordering of mixed-direction text

use unicode_bidi::{bidi_class, BidiClass, BidiInfo};

/// Whether the character is strongly right-to-left
pub fn is_rtl_char(c: char) -> bool {
    matches!(bidi_class(c), BidiClass::R | BidiClass::AL)
}

/// Whether any character of the text is strongly right-to-left
pub fn has_rtl(text: &str) -> bool {
    text.chars().any(is_rtl_char)
}

/// Reorder logical text into the left-to-right visual order a PDF draws in.
///
/// Each line is its own paragraph with an auto-detected base direction.
/// Paired brackets inside right-to-left runs are mirrored.
pub fn reorder_visual(text: &str) -> String {
    if !has_rtl(text) {
        return text.to_string();
    }

    text.split('\n')
        .map(reorder_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn reorder_line(line: &str) -> String {
    if line.is_empty() {
        return String::new();
    }

    let info = BidiInfo::new(line, None);
    let mut out = String::with_capacity(line.len());

    for para in &info.paragraphs {
        let (levels, runs) = info.visual_runs(para, para.range.clone());
        for run in runs {
            let slice = &line[run.clone()];
            if levels[run.start].is_rtl() {
                out.extend(slice.chars().rev().map(mirror));
            } else {
                out.push_str(slice);
            }
        }
    }

    out
}

fn mirror(c: char) -> char {
    match c {
        '(' => ')',
        ')' => '(',
        '[' => ']',
        ']' => '[',
        '{' => '}',
        '}' => '{',
        '<' => '>',
        '>' => '<',
        '«' => '»',
        '»' => '«',
        other => other,
    }
}
