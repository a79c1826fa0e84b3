//! Streaming rewriter: dispatches tokens to a [`TagHandler`] and splices the
//! output.
//!
//! Every element the handler sees opening is later reported closing, exactly
//! once and innermost first:
//! - void elements and self-closed tags close right after they open
//! - an end tag closes any elements left open inside it first
//! - elements still open at end of input are closed there
//!
//! An end tag without a matching open element is copied through and reported
//! to nobody.
//!
//! Handlers mutate the output through [`StartTag`] and [`EndTag`]. Output
//! is a list of [`Chunk`]s so a handler can leave a hole for markup that is
//! only known later.

use crate::node::Attributes;
use crate::tokenizer::{StartToken, Token, Tokenizer};

/// HTML elements that never have content or an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// A piece of rewritten output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Chunk {
    Markup(String),
    /// Placeholder for markup identified by a handler-chosen key.
    Deferred(usize),
}

/// Receives element and text events.
pub(crate) trait TagHandler {
    fn start_tag(&mut self, tag: &mut StartTag<'_>);

    fn end_tag(&mut self, _tag: &mut EndTag<'_>) {}

    fn text(&mut self, _text: &str) {}
}

#[derive(Debug, Default)]
enum StartAction {
    #[default]
    Keep,
    RemoveTags,
    Remove,
    Replace(String),
}

/// An element being opened.
pub(crate) struct StartTag<'a> {
    name: &'a str,
    attributes: &'a Attributes,
    action: StartAction,
}

impl StartTag<'_> {
    pub(crate) fn name(&self) -> &str {
        self.name
    }

    pub(crate) fn attributes(&self) -> &Attributes {
        self.attributes
    }

    /// Attribute value, treating an empty value as absent.
    pub(crate) fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).filter(|value| !value.is_empty())
    }

    /// Drop the start and end tags, keep the content.
    pub(crate) fn remove_tags(&mut self) {
        self.action = StartAction::RemoveTags;
    }

    /// Drop the element together with its content.
    pub(crate) fn remove(&mut self) {
        self.action = StartAction::Remove;
    }

    /// Replace the element and its content with raw markup.
    pub(crate) fn replace(&mut self, html: impl Into<String>) {
        self.action = StartAction::Replace(html.into());
    }
}

/// An element being closed.
pub(crate) struct EndTag<'a> {
    #[cfg_attr(not(test), allow(dead_code))]
    name: &'a str,
    after: Vec<Chunk>,
}

impl EndTag<'_> {
    #[cfg(test)]
    pub(crate) fn name(&self) -> &str {
        self.name
    }

    /// Leave a hole right after the end tag, to be filled by `key` later.
    pub(crate) fn after_deferred(&mut self, key: usize) {
        self.after.push(Chunk::Deferred(key));
    }
}

struct Frame {
    name: String,
    remove_tags: bool,
    suppress_content: bool,
}

struct Rewriter<'h, H> {
    handler: &'h mut H,
    open: Vec<Frame>,
    /// Number of open frames whose content is suppressed.
    suppressed: usize,
    chunks: Vec<Chunk>,
}

/// Run `handler` over `html` and return the rewritten output.
pub(crate) fn rewrite<H: TagHandler>(html: &str, handler: &mut H) -> Vec<Chunk> {
    let mut rewriter = Rewriter {
        handler,
        open: Vec::new(),
        suppressed: 0,
        chunks: Vec::new(),
    };

    for token in Tokenizer::new(html) {
        match token {
            Token::Start(start) => rewriter.on_start(&start),
            Token::End { name, raw } => rewriter.on_end(&name, raw),
            Token::Text(text) => {
                rewriter.handler.text(text);
                rewriter.emit(text);
            }
            Token::Other(raw) => rewriter.emit(raw),
        }
    }
    while let Some(frame) = rewriter.open.pop() {
        rewriter.close(&frame, None);
    }

    rewriter.chunks
}

/// Run `handler` over `html` where no deferred markup is expected.
pub(crate) fn rewrite_to_string<H: TagHandler>(html: &str, handler: &mut H) -> String {
    rewrite(html, handler)
        .into_iter()
        .filter_map(|chunk| match chunk {
            Chunk::Markup(markup) => Some(markup),
            Chunk::Deferred(_) => None,
        })
        .collect()
}

impl<H: TagHandler> Rewriter<'_, H> {
    fn on_start(&mut self, start: &StartToken<'_>) {
        let mut tag = StartTag {
            name: &start.name,
            attributes: &start.attributes,
            action: StartAction::Keep,
        };
        self.handler.start_tag(&mut tag);

        let mut frame = Frame {
            name: start.name.clone(),
            remove_tags: false,
            suppress_content: false,
        };
        match tag.action {
            StartAction::Keep => self.emit(start.raw),
            StartAction::RemoveTags => frame.remove_tags = true,
            StartAction::Remove => frame.suppress_content = true,
            StartAction::Replace(html) => {
                self.emit(&html);
                frame.suppress_content = true;
            }
        }
        if frame.suppress_content {
            frame.remove_tags = true;
            self.suppressed += 1;
        }

        if start.self_closing || VOID_ELEMENTS.contains(&start.name.as_str()) {
            self.close(&frame, None);
        } else {
            self.open.push(frame);
        }
    }

    fn on_end(&mut self, name: &str, raw: &str) {
        let Some(index) = self.open.iter().rposition(|frame| frame.name == name) else {
            self.emit(raw);
            return;
        };
        while self.open.len() > index + 1 {
            if let Some(frame) = self.open.pop() {
                self.close(&frame, None);
            }
        }
        if let Some(frame) = self.open.pop() {
            self.close(&frame, Some(raw));
        }
    }

    fn close(&mut self, frame: &Frame, raw: Option<&str>) {
        let mut tag = EndTag {
            name: &frame.name,
            after: Vec::new(),
        };
        self.handler.end_tag(&mut tag);

        if !frame.remove_tags
            && let Some(raw) = raw
        {
            self.emit(raw);
        }
        if frame.suppress_content {
            self.suppressed -= 1;
        }
        for chunk in tag.after {
            match chunk {
                Chunk::Markup(markup) => self.emit(&markup),
                Chunk::Deferred(key) => self.emit_deferred(key),
            }
        }
    }

    fn emit(&mut self, markup: &str) {
        if self.suppressed > 0 || markup.is_empty() {
            return;
        }
        if let Some(Chunk::Markup(last)) = self.chunks.last_mut() {
            last.push_str(markup);
        } else {
            self.chunks.push(Chunk::Markup(markup.to_owned()));
        }
    }

    fn emit_deferred(&mut self, key: usize) {
        if self.suppressed == 0 {
            self.chunks.push(Chunk::Deferred(key));
        }
    }
}
