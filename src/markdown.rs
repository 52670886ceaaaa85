//! Markdown to HTML
//!
//! The result is inserted into templates without escaping, so every caller
//! gets the same rendering: CommonMark plus links that open in a new tab.

use pulldown_cmark::escape::{escape_href, escape_html};
use pulldown_cmark::{html, CowStr, Event, Parser, Tag};

/// Converts a string formatted with markdown to html.
pub fn render_markdown(text: &str) -> String {
    let parser = Parser::new(text).map(|event| match event {
        Event::Start(Tag::Link(_, dest, title)) => Event::Html(open_new_tab_link(&dest, &title)),
        Event::End(Tag::Link(..)) => Event::Html(CowStr::Borrowed("</a>")),
        other => other,
    });

    let mut output = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut output, parser);
    output.trim_end().to_string()
}

fn open_new_tab_link(dest: &str, title: &str) -> CowStr<'static> {
    let mut tag = String::from("<a href=\"");
    let _ = escape_href(&mut tag, dest);
    if !title.is_empty() {
        tag.push_str("\" title=\"");
        let _ = escape_html(&mut tag, title);
    }
    tag.push_str("\" target=\"_blank\">");
    CowStr::from(tag)
}
