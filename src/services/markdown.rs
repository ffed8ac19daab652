use pulldown_cmark::{CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

/// Turns stored markdown into something a view can display. Raw text is what
/// gets persisted; the rendered form only ever lives in the message log.
pub trait MarkupRenderer {
    type Output: Clone;

    fn render(&self, markdown: &str) -> Self::Output;
}

/// Renders markdown into the block model below. Raw HTML in the input is kept
/// as literal text, never interpreted.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl MarkupRenderer for MarkdownRenderer {
    type Output = Vec<MessageBlock>;

    fn render(&self, markdown: &str) -> Self::Output {
        parse_markdown(markdown)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MessageBlock {
    RichText(Vec<InlineSpan>),
    CodeBlock {
        language: Option<String>,
        code: String,
    },
    Heading {
        level: u8,
        spans: Vec<InlineSpan>,
    },
    BlockQuote(Vec<MessageBlock>),
    OrderedList {
        start: u64,
        items: Vec<Vec<MessageBlock>>,
    },
    UnorderedList(Vec<Vec<MessageBlock>>),
    /// Rows of cells; each cell is a run of inline spans.
    Table {
        header: Vec<Vec<InlineSpan>>,
        rows: Vec<Vec<Vec<InlineSpan>>>,
    },
    HorizontalRule,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlineSpan {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub code: bool,
    pub link_url: Option<String>,
}

pub fn parse_markdown(input: &str) -> Vec<MessageBlock> {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES;
    let mut builder = BlockBuilder::default();
    for event in Parser::new_ext(input, options) {
        builder.handle(event);
    }
    builder.finish()
}

enum Container {
    Quote(Vec<MessageBlock>),
    List {
        start: Option<u64>,
        items: Vec<Vec<MessageBlock>>,
        current: Vec<MessageBlock>,
    },
}

#[derive(Default)]
struct TableState {
    header: Vec<Vec<InlineSpan>>,
    rows: Vec<Vec<Vec<InlineSpan>>>,
    row: Vec<Vec<InlineSpan>>,
}

#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<MessageBlock>,
    containers: Vec<Container>,
    spans: Vec<InlineSpan>,
    bold: bool,
    italic: bool,
    strikethrough: bool,
    link_url: Option<String>,
    // (language, accumulated source) while inside a fenced or indented block
    code: Option<(Option<String>, String)>,
    heading: Option<u8>,
    table: Option<TableState>,
}

impl BlockBuilder {
    fn handle(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => self.text(text),
            Event::Code(code) => self.push_span(code.to_string(), true),
            Event::SoftBreak => self.push_span(" ".to_string(), false),
            Event::HardBreak => self.push_span("\n".to_string(), false),
            Event::Rule => {
                self.flush_spans();
                self.push_block(MessageBlock::HorizontalRule);
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush_spans();
                self.heading = Some(heading_level(level));
            }
            Tag::Strong => self.bold = true,
            Tag::Emphasis => self.italic = true,
            Tag::Strikethrough => self.strikethrough = true,
            Tag::Link { dest_url, .. } => self.link_url = Some(dest_url.to_string()),
            Tag::CodeBlock(kind) => {
                self.flush_spans();
                let language = match kind {
                    CodeBlockKind::Fenced(lang) if !lang.trim().is_empty() => {
                        Some(lang.trim().to_string())
                    }
                    _ => None,
                };
                self.code = Some((language, String::new()));
            }
            Tag::BlockQuote(_) => {
                self.flush_spans();
                self.containers.push(Container::Quote(Vec::new()));
            }
            Tag::List(start) => {
                self.flush_spans();
                self.containers.push(Container::List {
                    start,
                    items: Vec::new(),
                    current: Vec::new(),
                });
            }
            Tag::Table(_) => {
                self.flush_spans();
                self.table = Some(TableState::default());
            }
            Tag::HtmlBlock => self.flush_spans(),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.flush_spans(),
            TagEnd::Heading(_) => {
                if let Some(level) = self.heading.take() {
                    let spans = std::mem::take(&mut self.spans);
                    self.push_block(MessageBlock::Heading { level, spans });
                }
            }
            TagEnd::Strong => self.bold = false,
            TagEnd::Emphasis => self.italic = false,
            TagEnd::Strikethrough => self.strikethrough = false,
            TagEnd::Link => self.link_url = None,
            TagEnd::CodeBlock => {
                if let Some((language, code)) = self.code.take() {
                    let code = code.trim_end_matches('\n').to_string();
                    self.push_block(MessageBlock::CodeBlock { language, code });
                }
            }
            TagEnd::BlockQuote(_) => {
                self.flush_spans();
                if let Some(Container::Quote(inner)) = self.containers.pop() {
                    self.push_block(MessageBlock::BlockQuote(inner));
                }
            }
            TagEnd::Item => {
                self.flush_spans();
                if let Some(Container::List { items, current, .. }) = self.containers.last_mut() {
                    items.push(std::mem::take(current));
                }
            }
            TagEnd::List(_) => {
                self.flush_spans();
                if let Some(Container::List { start, items, .. }) = self.containers.pop() {
                    let block = match start {
                        Some(start) => MessageBlock::OrderedList { start, items },
                        None => MessageBlock::UnorderedList(items),
                    };
                    self.push_block(block);
                }
            }
            TagEnd::TableCell => {
                let cell = std::mem::take(&mut self.spans);
                if let Some(table) = &mut self.table {
                    table.row.push(cell);
                }
            }
            // The header row has no TableRow of its own.
            TagEnd::TableHead => {
                if let Some(table) = &mut self.table {
                    table.header = std::mem::take(&mut table.row);
                }
            }
            TagEnd::TableRow => {
                if let Some(table) = &mut self.table {
                    let row = std::mem::take(&mut table.row);
                    table.rows.push(row);
                }
            }
            TagEnd::Table => {
                if let Some(TableState { header, rows, .. }) = self.table.take() {
                    self.push_block(MessageBlock::Table { header, rows });
                }
            }
            TagEnd::HtmlBlock => self.flush_spans(),
            _ => {}
        }
    }

    fn text(&mut self, text: CowStr) {
        match &mut self.code {
            Some((_, code)) => code.push_str(&text),
            None => self.push_span(text.to_string(), false),
        }
    }

    fn push_span(&mut self, text: String, code: bool) {
        self.spans.push(InlineSpan {
            text,
            bold: self.bold,
            italic: self.italic,
            strikethrough: self.strikethrough,
            code,
            link_url: self.link_url.clone(),
        });
    }

    fn flush_spans(&mut self) {
        // Heading spans are collected until the heading closes.
        if self.heading.is_some() || self.spans.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.spans);
        self.push_block(MessageBlock::RichText(spans));
    }

    fn push_block(&mut self, block: MessageBlock) {
        match self.containers.last_mut() {
            Some(Container::Quote(blocks)) => blocks.push(block),
            Some(Container::List { current, .. }) => current.push(block),
            None => self.blocks.push(block),
        }
    }

    fn finish(mut self) -> Vec<MessageBlock> {
        self.flush_spans();
        self.blocks
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Plain-text projection of rendered blocks, used for copying and previews.
pub fn blocks_to_plain_text(blocks: &[MessageBlock]) -> String {
    let mut out = Vec::new();
    for block in blocks {
        match block {
            MessageBlock::RichText(spans) | MessageBlock::Heading { spans, .. } => {
                out.push(spans.iter().map(|s| s.text.as_str()).collect::<String>());
            }
            MessageBlock::CodeBlock { code, .. } => out.push(code.clone()),
            MessageBlock::BlockQuote(inner) => out.push(blocks_to_plain_text(inner)),
            MessageBlock::OrderedList { items, .. } | MessageBlock::UnorderedList(items) => {
                for item in items {
                    out.push(blocks_to_plain_text(item));
                }
            }
            MessageBlock::Table { header, rows } => {
                for row in std::iter::once(header).chain(rows) {
                    let cells: Vec<String> = row
                        .iter()
                        .map(|cell| cell.iter().map(|s| s.text.as_str()).collect())
                        .collect();
                    out.push(cells.join(" | "));
                }
            }
            MessageBlock::HorizontalRule => {}
        }
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rich_text(block: &MessageBlock) -> &[InlineSpan] {
        match block {
            MessageBlock::RichText(spans) => spans,
            other => panic!("Expected RichText, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_text() {
        let blocks = parse_markdown("A binary search tree is...");
        assert_eq!(blocks.len(), 1);
        let spans = rich_text(&blocks[0]);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "A binary search tree is...");
        assert!(!spans[0].bold);
    }

    #[test]
    fn test_bold_italic_and_inline_code() {
        let blocks = parse_markdown("**O(log n)** lookups, *balanced* via `rotate()`");
        let spans = rich_text(&blocks[0]);
        assert!(spans.iter().any(|s| s.bold && s.text == "O(log n)"));
        assert!(spans.iter().any(|s| s.italic && s.text == "balanced"));
        assert!(spans.iter().any(|s| s.code && s.text == "rotate()"));
    }

    #[test]
    fn test_code_block() {
        let blocks = parse_markdown("```rust\nfn height(n: &Node) -> usize { 0 }\n```");
        assert_eq!(
            blocks,
            vec![MessageBlock::CodeBlock {
                language: Some("rust".to_string()),
                code: "fn height(n: &Node) -> usize { 0 }".to_string(),
            }]
        );
    }

    #[test]
    fn test_heading() {
        let blocks = parse_markdown("## Complexity");
        match &blocks[0] {
            MessageBlock::Heading { level, spans } => {
                assert_eq!(*level, 2);
                assert_eq!(spans[0].text, "Complexity");
            }
            other => panic!("Expected Heading, got {:?}", other),
        }
    }

    #[test]
    fn test_lists() {
        let blocks = parse_markdown("1. insert\n2. delete\n\n- min\n- max\n- search");
        assert_eq!(blocks.len(), 2);
        assert!(matches!(
            &blocks[0],
            MessageBlock::OrderedList { start: 1, items } if items.len() == 2
        ));
        assert!(matches!(&blocks[1], MessageBlock::UnorderedList(items) if items.len() == 3));
    }

    #[test]
    fn test_ordered_list_keeps_start_number() {
        let blocks = parse_markdown("3. relax edges
4. repeat");
        assert!(matches!(
            &blocks[0],
            MessageBlock::OrderedList { start: 3, items } if items.len() == 2
        ));
    }

    #[test]
    fn test_table_keeps_cells_apart() {
        let blocks =
            parse_markdown("| Op | Time |\n|---|---|\n| insert | **O(log n)** |\n\nAfter.");
        assert_eq!(blocks.len(), 2);
        match &blocks[0] {
            MessageBlock::Table { header, rows } => {
                assert_eq!(header.len(), 2);
                assert_eq!(header[1][0].text, "Time");
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0][0][0].text, "insert");
                assert!(rows[0][1][0].bold);
            }
            other => panic!("Expected Table, got {:?}", other),
        }
        assert_eq!(rich_text(&blocks[1])[0].text, "After.");
        assert_eq!(
            blocks_to_plain_text(&blocks),
            "Op | Time\ninsert | O(log n)\nAfter."
        );
    }

    #[test]
    fn test_html_block_is_its_own_block() {
        let blocks = parse_markdown("<div>heap</div>\n\nSift down.");
        assert_eq!(blocks.len(), 2);
        assert_eq!(rich_text(&blocks[1])[0].text, "Sift down.");
    }

    #[test]
    fn test_list_inside_blockquote_stays_inside() {
        let blocks = parse_markdown("> steps:\n>\n> - push\n> - pop");
        assert_eq!(blocks.len(), 1);
        match &blocks[0] {
            MessageBlock::BlockQuote(inner) => {
                assert_eq!(inner.len(), 2);
                assert!(matches!(&inner[1], MessageBlock::UnorderedList(items) if items.len() == 2));
            }
            other => panic!("Expected BlockQuote, got {:?}", other),
        }
    }

    #[test]
    fn test_horizontal_rule() {
        let blocks = parse_markdown("above\n\n---\n\nbelow");
        assert!(blocks.iter().any(|b| matches!(b, MessageBlock::HorizontalRule)));
    }

    #[test]
    fn test_raw_html_stays_literal() {
        let blocks = MarkdownRenderer.render("<script>alert(1)</script> tree");
        let text = blocks_to_plain_text(&blocks);
        assert!(text.contains("<script>"));
    }

    #[test]
    fn test_plain_text_projection() {
        let blocks = parse_markdown("# Stack\n\nLIFO order.\n\n```\npush(1)\n```");
        assert_eq!(blocks_to_plain_text(&blocks), "Stack\nLIFO order.\npush(1)");
    }
}
