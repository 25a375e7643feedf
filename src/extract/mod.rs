
use anyhow::{Context, Result};
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Extract plain text from each file in a batch, preserving upload order.
///
/// A file that yields no text contributes an empty string; the caller's
/// chunker treats that as nothing rather than an error. An unreadable file
/// is a hard error, reported before any index gets replaced.
#[inline]
pub fn extract_documents<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<String>> {
    let mut texts = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let text = extract_file(path)
            .with_context(|| format!("Failed to extract text from {}", path.display()))?;
        if text.is_empty() {
            warn!("No extractable text in {}", path.display());
        }
        texts.push(text);
    }
    Ok(texts)
}

/// Extract the plain text of a single file.
///
/// Markdown files are rendered to plain text with markup stripped; anything
/// else is read as UTF-8 with invalid sequences replaced.
#[inline]
pub fn extract_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    let raw = String::from_utf8_lossy(&bytes);

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let text = match extension.as_deref() {
        Some("md" | "markdown") => markdown_to_text(&raw),
        _ => raw.into_owned(),
    };

    debug!(
        "Extracted {} chars from {}",
        text.chars().count(),
        path.display()
    );
    Ok(text)
}

/// Render markdown to plain text, keeping text and code content in document
/// order and dropping all markup.
fn markdown_to_text(markdown: &str) -> String {
    let mut text = String::with_capacity(markdown.len());

    for event in Parser::new(markdown) {
        match event {
            Event::Text(content) | Event::Code(content) => text.push_str(&content),
            Event::SoftBreak | Event::HardBreak => text.push('\n'),
            Event::End(
                TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item | TagEnd::CodeBlock,
            ) => text.push('\n'),
            Event::Start(Tag::Item) => {
                if !text.is_empty() && !text.ends_with('\n') {
                    text.push('\n');
                }
            }
            _ => {}
        }
    }

    text.trim_end().to_string()
}
