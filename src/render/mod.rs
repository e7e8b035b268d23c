//! Sanitized rendering of message text.
//!
//! Everything a UI shows for a message passes through a [`Renderer`] and comes
//! back as [`SafeMarkup`]. Streaming replies are re-rendered whole on every
//! fragment through a [`RenderAccumulator`], so partially received markup
//! (an unclosed code fence, a half-typed link) always renders to something
//! valid.

mod escape;
mod html;

use std::fmt;
use std::sync::Arc;

pub use html::HtmlRenderer;

/// Author of a visible message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

/// HTML fragment that has been escaped and restricted to an element allowlist.
///
/// Outside this module the only constructor is [`SafeMarkup::escaped`], which
/// treats its input as plain text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SafeMarkup(String);

impl SafeMarkup {
    /// Plain text, escaped, with each newline as `<br>`.
    pub fn escaped(text: &str) -> Self {
        let mut out = String::with_capacity(text.len());
        escape::escape_with_breaks(text, &mut out);
        Self(out)
    }

    pub(crate) fn from_sanitized(html: String) -> Self {
        Self(html)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SafeMarkup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SafeMarkup {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub trait Renderer {
    fn render(&self, text: &str, role: MessageRole) -> SafeMarkup;
}

impl<R: Renderer + ?Sized> Renderer for Arc<R> {
    fn render(&self, text: &str, role: MessageRole) -> SafeMarkup {
        (**self).render(text, role)
    }
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn render(&self, text: &str, role: MessageRole) -> SafeMarkup {
        (**self).render(text, role)
    }
}

/// Accumulates streamed fragments and keeps a fresh rendering of the whole
/// text.
pub struct RenderAccumulator {
    renderer: Arc<dyn Renderer + Send + Sync>,
    role: MessageRole,
    text: String,
    markup: SafeMarkup,
}

impl fmt::Debug for RenderAccumulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderAccumulator")
            .field("role", &self.role)
            .field("text_len", &self.text.len())
            .finish()
    }
}

impl RenderAccumulator {
    pub fn new(renderer: Arc<dyn Renderer + Send + Sync>, role: MessageRole) -> Self {
        Self {
            renderer,
            role,
            text: String::new(),
            markup: SafeMarkup::default(),
        }
    }

    pub fn role(&self) -> MessageRole {
        self.role
    }

    /// Append a fragment and re-render everything received so far.
    pub fn push(&mut self, fragment: &str) -> &SafeMarkup {
        self.text.push_str(fragment);
        self.rerender()
    }

    /// Replace the accumulated text and re-render it.
    pub fn update(&mut self, full_text: &str) -> &SafeMarkup {
        self.text.clear();
        self.text.push_str(full_text);
        self.rerender()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn markup(&self) -> &SafeMarkup {
        &self.markup
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn into_text(self) -> String {
        self.text
    }

    fn rerender(&mut self) -> &SafeMarkup {
        self.markup = self.renderer.render(&self.text, self.role);
        &self.markup
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{HtmlRenderer, MessageRole, RenderAccumulator, Renderer, SafeMarkup};
    use pretty_assertions::assert_eq;

    #[test]
    fn escaped_markup_breaks_lines() {
        assert_eq!(
            SafeMarkup::escaped("a < b\nc").as_str(),
            "a &lt; b<br>c"
        );
    }

    #[test]
    fn push_rerenders_the_whole_text() {
        let renderer = Arc::new(HtmlRenderer::new());
        let mut accumulator = RenderAccumulator::new(renderer.clone(), MessageRole::Assistant);

        accumulator.push("**ol");
        accumulator.push("á**");

        assert_eq!(accumulator.text(), "**olá**");
        assert_eq!(
            accumulator.markup(),
            &renderer.render("**olá**", MessageRole::Assistant)
        );
        assert_eq!(accumulator.markup().as_str(), "<p><strong>olá</strong></p>");
    }

    #[test]
    fn update_is_idempotent() {
        let renderer = Arc::new(HtmlRenderer::new());
        let mut accumulator = RenderAccumulator::new(renderer, MessageRole::Assistant);

        let first = accumulator.update("# Título\n\ntexto").clone();
        let second = accumulator.update("# Título\n\ntexto").clone();
        assert_eq!(first, second);
        assert_eq!(accumulator.text(), "# Título\n\ntexto");
    }

    #[test]
    fn update_replaces_previous_text() {
        let renderer = Arc::new(HtmlRenderer::new());
        let mut accumulator = RenderAccumulator::new(renderer, MessageRole::User);

        accumulator.push("rascunho");
        accumulator.update("final");
        assert_eq!(accumulator.into_text(), "final");
    }
}
