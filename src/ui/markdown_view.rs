use gtk::prelude::*;

use crate::services::markdown::{InlineSpan, MessageBlock};

/// Pango markup for a run of inline spans. Span text and link targets are
/// escaped, so model output can never inject markup of its own.
pub fn spans_to_pango_markup(spans: &[InlineSpan]) -> String {
    let mut markup = String::new();
    for span in spans {
        let mut closing = Vec::new();

        if let Some(url) = &span.link_url {
            markup.push_str(&format!("<a href=\"{}\">", glib::markup_escape_text(url)));
            closing.push("</a>");
        }
        let styles = [
            (span.strikethrough, "<s>", "</s>"),
            (span.italic, "<i>", "</i>"),
            (span.bold, "<b>", "</b>"),
            (span.code, "<tt>", "</tt>"),
        ];
        for (enabled, open, close) in styles {
            if enabled {
                markup.push_str(open);
                closing.push(close);
            }
        }

        markup.push_str(&glib::markup_escape_text(&span.text));
        for close in closing.iter().rev() {
            markup.push_str(close);
        }
    }
    markup
}

/// Append one widget per block to `container`.
pub fn render_blocks(container: &gtk::Box, blocks: &[MessageBlock]) {
    for block in blocks {
        container.append(&block_to_widget(block));
    }
}

fn markup_label(spans: &[InlineSpan]) -> gtk::Label {
    let label = gtk::Label::builder()
        .halign(gtk::Align::Start)
        .xalign(0.0)
        .wrap(true)
        .wrap_mode(gtk::pango::WrapMode::WordChar)
        .selectable(true)
        .use_markup(true)
        .build();
    label.set_markup(&spans_to_pango_markup(spans));
    label
}

fn block_to_widget(block: &MessageBlock) -> gtk::Widget {
    match block {
        MessageBlock::RichText(spans) => markup_label(spans).upcast(),
        MessageBlock::Heading { level, spans } => {
            let label = markup_label(spans);
            label.add_css_class(match level {
                1 => "heading-1",
                2 => "heading-2",
                3 => "heading-3",
                _ => "heading-4",
            });
            label.upcast()
        }
        MessageBlock::CodeBlock { language, code } => build_code_block(language.as_deref(), code),
        MessageBlock::BlockQuote(inner) => {
            let quote = gtk::Box::builder()
                .orientation(gtk::Orientation::Vertical)
                .spacing(4)
                .build();
            quote.add_css_class("blockquote");
            render_blocks(&quote, inner);
            quote.upcast()
        }
        MessageBlock::OrderedList { start, items } => build_list(items, Some(*start)),
        MessageBlock::UnorderedList(items) => build_list(items, None),
        MessageBlock::Table { header, rows } => build_table(header, rows),
        MessageBlock::HorizontalRule => gtk::Separator::builder()
            .orientation(gtk::Orientation::Horizontal)
            .margin_top(4)
            .margin_bottom(4)
            .build()
            .upcast(),
    }
}

fn build_code_block(language: Option<&str>, code: &str) -> gtk::Widget {
    let outer = gtk::Box::builder()
        .orientation(gtk::Orientation::Vertical)
        .margin_top(4)
        .margin_bottom(4)
        .build();
    outer.add_css_class("code-block");

    let header = gtk::Box::builder()
        .orientation(gtk::Orientation::Horizontal)
        .spacing(8)
        .build();
    header.add_css_class("code-block-header");

    let lang_label = gtk::Label::builder()
        .label(language.unwrap_or("code"))
        .halign(gtk::Align::Start)
        .hexpand(true)
        .build();
    lang_label.add_css_class("code-block-language");
    header.append(&lang_label);

    let copy_button = gtk::Button::builder()
        .icon_name("edit-copy-symbolic")
        .tooltip_text("Copy code")
        .build();
    copy_button.add_css_class("flat");
    copy_button.add_css_class("circular");

    let source = code.to_string();
    copy_button.connect_clicked(move |button| {
        button.clipboard().set_text(&source);
        button.set_icon_name("object-select-symbolic");
        let button = button.clone();
        glib::timeout_add_local_once(std::time::Duration::from_millis(1500), move || {
            // The row may have been rebuilt since the click.
            if button.parent().is_some() {
                button.set_icon_name("edit-copy-symbolic");
            }
        });
    });
    header.append(&copy_button);
    outer.append(&header);

    let text_view = gtk::TextView::builder()
        .editable(false)
        .cursor_visible(false)
        .wrap_mode(gtk::WrapMode::WordChar)
        .monospace(true)
        .top_margin(8)
        .bottom_margin(8)
        .left_margin(12)
        .right_margin(12)
        .build();
    text_view.buffer().set_text(code);
    text_view.add_css_class("code-block-content");
    outer.append(&text_view);

    outer.upcast()
}

/// `start` is the first number of an ordered list, `None` for bullets.
fn build_list(items: &[Vec<MessageBlock>], start: Option<u64>) -> gtk::Widget {
    let list = gtk::Box::builder()
        .orientation(gtk::Orientation::Vertical)
        .spacing(2)
        .margin_start(4)
        .build();

    for (i, item) in (0u64..).zip(items) {
        let row = gtk::Box::builder()
            .orientation(gtk::Orientation::Horizontal)
            .spacing(4)
            .build();

        let marker = match start {
            Some(start) => format!("{}.", start + i),
            None => "\u{2022}".to_string(),
        };
        let bullet = gtk::Label::builder()
            .label(marker)
            .valign(gtk::Align::Start)
            .build();
        bullet.add_css_class("list-bullet");
        row.append(&bullet);

        let content = gtk::Box::builder()
            .orientation(gtk::Orientation::Vertical)
            .spacing(2)
            .build();
        render_blocks(&content, item);
        row.append(&content);

        list.append(&row);
    }

    list.upcast()
}

fn build_table(header: &[Vec<InlineSpan>], rows: &[Vec<Vec<InlineSpan>>]) -> gtk::Widget {
    let grid = gtk::Grid::builder()
        .column_spacing(16)
        .row_spacing(4)
        .margin_top(4)
        .margin_bottom(4)
        .build();
    grid.add_css_class("message-table");

    for (column, cell) in (0i32..).zip(header) {
        let label = markup_label(cell);
        label.add_css_class("heading");
        grid.attach(&label, column, 0, 1, 1);
    }
    for (row_index, row) in (1i32..).zip(rows) {
        for (column, cell) in (0i32..).zip(row) {
            grid.attach(&markup_label(cell), column, row_index, 1, 1);
        }
    }

    grid.upcast()
}
