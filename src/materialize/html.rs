use scraper::{Html, Node};

/// Elements whose text is never part of a transcript
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Separator placed between text blocks
const BLOCK_SEPARATOR: &str = "\n\n";

/// Flatten an HTML transcript to plain text.
///
/// Every text node is trimmed; empty ones and those inside [`SKIPPED_ELEMENTS`]
/// are dropped and the rest are joined with a blank line, so paragraphs, list
/// items and table cells each end up on their own block.
pub fn html_to_text(html: &[u8]) -> String {
    let source = String::from_utf8_lossy(html);
    let document = Html::parse_document(&source);

    let blocks: Vec<&str> = document
        .root_element()
        .descendants()
        .filter_map(|node| match node.value() {
            Node::Text(text) => {
                let skipped = node.ancestors().any(|ancestor| {
                    ancestor
                        .value()
                        .as_element()
                        .is_some_and(|element| SKIPPED_ELEMENTS.contains(&element.name()))
                });
                (!skipped).then(|| text.trim())
            }
            _ => None,
        })
        .filter(|text| !text.is_empty())
        .collect();

    blocks.join(BLOCK_SEPARATOR)
}
