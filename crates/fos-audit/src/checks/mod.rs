//! Built-in handlers
//!
//! Native code behind the shipped rule and check packs, grouped by the
//! pack that names it.

mod aria;
mod color;
mod document;
mod keyboard;
mod landmarks;
mod media;
mod parsing;
mod target;
mod text_alternatives;

use crate::registry::Registry;

/// Register every built-in evaluator, matcher and after handler
pub fn register(registry: &mut Registry) {
    text_alternatives::register(registry);
    aria::register(registry);
    landmarks::register(registry);
    keyboard::register(registry);
    parsing::register(registry);
    color::register(registry);
    target::register(registry);
    document::register(registry);
    media::register(registry);
}
