use std::io::Cursor;

use docx_rs::{
    AlignmentType, BreakType, Docx, PageMargin, Paragraph, Run, RunFonts, Style, StyleType,
};

use crate::error::ExportError;
use crate::styles::DocumentStyles;

/// Lay out rendered Markdown-ish text as a DOCX document.
///
/// Understood syntax, one construct per line:
/// - `#`, `##`, `###` headings
/// - `- item` bullets
/// - `**bold**` inline
/// - `---` a horizontal break (page break before the closing notice)
/// - anything else is a body paragraph; blank lines are kept as spacing
pub fn generate_docx(rendered: &str, styles: &DocumentStyles) -> Result<Vec<u8>, ExportError> {
    let margin = styles.margin_twips();
    let mut docx = Docx::new()
        .page_margin(
            PageMargin::new()
                .top(margin)
                .bottom(margin)
                .left(margin)
                .right(margin),
        )
        .add_style(heading_style("Heading1", "heading 1", styles.heading1_size, styles))
        .add_style(heading_style("Heading2", "heading 2", styles.heading2_size, styles))
        .add_style(heading_style("Heading3", "heading 3", styles.heading3_size, styles));

    let mut previous_blank = false;
    for line in rendered.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            // Collapse runs of blank lines left over by template tags.
            if !previous_blank {
                docx = docx.add_paragraph(Paragraph::new());
            }
            previous_blank = true;
            continue;
        }
        previous_blank = false;

        let paragraph = if let Some(text) = trimmed.strip_prefix("### ") {
            heading_paragraph(text, "Heading3", styles)
        } else if let Some(text) = trimmed.strip_prefix("## ") {
            heading_paragraph(text, "Heading2", styles)
        } else if let Some(text) = trimmed.strip_prefix("# ") {
            heading_paragraph(text, "Heading1", styles)
        } else if let Some(text) = trimmed.strip_prefix("- ") {
            bullet_paragraph(text, styles)
        } else if trimmed == "---" {
            Paragraph::new().add_run(Run::new().add_break(BreakType::Page))
        } else {
            body_paragraph(trimmed, styles)
        };
        docx = docx.add_paragraph(paragraph);
    }

    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| ExportError::Docx(e.to_string()))?;

    Ok(buf.into_inner())
}

fn heading_style(style_id: &str, name: &str, size_pt: usize, styles: &DocumentStyles) -> Style {
    Style::new(style_id, StyleType::Paragraph)
        .name(name)
        .size(size_pt * 2) // half-points
        .bold()
        .fonts(RunFonts::new().ascii(&styles.heading_font).hi_ansi(&styles.heading_font))
}

fn heading_paragraph(text: &str, style_id: &str, styles: &DocumentStyles) -> Paragraph {
    Paragraph::new()
        .style(style_id)
        .add_run(Run::new().add_text(text).fonts(heading_fonts(styles)))
}

fn bullet_paragraph(text: &str, styles: &DocumentStyles) -> Paragraph {
    let bullet = text_run("\u{2022} ", styles);
    parse_inline(text, styles)
        .into_iter()
        .fold(Paragraph::new().align(AlignmentType::Left).add_run(bullet), |p, run| {
            p.add_run(run)
        })
}

fn body_paragraph(text: &str, styles: &DocumentStyles) -> Paragraph {
    parse_inline(text, styles)
        .into_iter()
        .fold(Paragraph::new().align(AlignmentType::Both), |p, run| p.add_run(run))
}

fn body_fonts(styles: &DocumentStyles) -> RunFonts {
    RunFonts::new().ascii(&styles.body_font).hi_ansi(&styles.body_font)
}

fn heading_fonts(styles: &DocumentStyles) -> RunFonts {
    RunFonts::new().ascii(&styles.heading_font).hi_ansi(&styles.heading_font)
}

fn text_run(text: &str, styles: &DocumentStyles) -> Run {
    Run::new()
        .add_text(text)
        .size(styles.body_size * 2)
        .fonts(body_fonts(styles))
}

/// Split `**bold**` spans into runs. An unmatched `**` is kept literally.
fn parse_inline(text: &str, styles: &DocumentStyles) -> Vec<Run> {
    inline_spans(text)
        .into_iter()
        .map(|(span, bold)| {
            let run = text_run(span, styles);
            if bold { run.bold() } else { run }
        })
        .collect()
}

fn inline_spans(text: &str) -> Vec<(&str, bool)> {
    let mut spans = Vec::new();
    let mut remaining = text;

    while let Some(start) = remaining.find("**") {
        let after = &remaining[start + 2..];
        let Some(end) = after.find("**") else {
            break;
        };
        if start > 0 {
            spans.push((&remaining[..start], false));
        }
        if end > 0 {
            spans.push((&after[..end], true));
        }
        remaining = &after[end + 2..];
    }

    if !remaining.is_empty() {
        spans.push((remaining, false));
    }
    spans
}
