//! fOS HTML Parser
//!
//! HTML5 parser built on html5ever. Produces [`fos_dom::Document`]s, and
//! whole [`fos_dom::Page`]s when `srcdoc` frames are involved.

mod parser;

pub use fos_dom::{Document, Page};
pub use parser::HtmlParser;

/// Parse an HTML string into a document
pub fn parse(html: &str) -> Document {
    HtmlParser::new().parse(html)
}

/// Parse an HTML string into a page, loading `srcdoc` frames
pub fn parse_page(html: &str, url: &str) -> Page {
    HtmlParser::new().parse_page(html, url)
}
