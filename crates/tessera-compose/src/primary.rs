//! Directive dispatch for the primary document.
//!
//! Recognizes `<include path>` and `<fill slot>`, captures fill bodies into
//! the [`CompositionState`], and replaces every include that has a path with
//! a deferred hole. The include's content never reaches the output; fills
//! inside it are captured from the events alone. The holes are filled by the
//! composer once the includes are rendered.

use crate::node::NodeId;
use crate::rewriter::{EndTag, StartTag, TagHandler};
use crate::state::{CompositionState, SlotMap};

/// An include waiting to be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingInclude {
    pub(crate) path: String,
    /// Slot buffer of `path` as it stood when the include closed.
    pub(crate) slots: SlotMap,
}

/// What to do when an element closes.
enum CloseAction {
    Pop,
    EndFill { slot: String, node: NodeId },
    RenderInclude { path: String },
}

pub(crate) struct PrimaryHandler {
    state: CompositionState,
    /// One entry per open element, mirroring the rewriter's open stack.
    actions: Vec<CloseAction>,
    includes: Vec<PendingInclude>,
}

impl PrimaryHandler {
    pub(crate) fn new() -> Self {
        Self {
            state: CompositionState::new(),
            actions: Vec::new(),
            includes: Vec::new(),
        }
    }

    /// Includes in close order; a deferred hole's key indexes this list.
    pub(crate) fn into_includes(self) -> Vec<PendingInclude> {
        self.includes
    }

    fn open_include(&mut self, tag: &mut StartTag<'_>, node: NodeId) -> CloseAction {
        let Some(path) = tag.get_attribute("path").map(str::to_owned) else {
            return CloseAction::Pop;
        };
        if self.state.is_capturing() {
            self.state.capture_element(node);
        }
        self.state.open_include(&path);
        tag.remove();
        CloseAction::RenderInclude { path }
    }

    fn open_fill(&mut self, tag: &mut StartTag<'_>, node: NodeId) -> CloseAction {
        let Some(slot) = tag.get_attribute("slot").map(str::to_owned) else {
            return CloseAction::Pop;
        };
        self.state.begin_fill(&slot);
        tag.remove_tags();
        CloseAction::EndFill { slot, node }
    }
}

impl TagHandler for PrimaryHandler {
    fn start_tag(&mut self, tag: &mut StartTag<'_>) {
        let node = self
            .state
            .push_element(tag.name(), tag.attributes().clone());

        let action = match tag.name() {
            "include" => self.open_include(tag, node),
            "fill" => self.open_fill(tag, node),
            _ => {
                if self.state.is_capturing() {
                    self.state.capture_element(node);
                }
                CloseAction::Pop
            }
        };
        self.actions.push(action);
    }

    fn end_tag(&mut self, tag: &mut EndTag<'_>) {
        match self.actions.pop() {
            Some(CloseAction::EndFill { slot, node }) => self.state.end_fill(&slot, node),
            Some(CloseAction::RenderInclude { path }) => {
                let slots = self.state.slot_markup(&path);
                tracing::debug!(path = %path, slots = slots.len(), "Include closed");
                tag.after_deferred(self.includes.len());
                self.includes.push(PendingInclude { path, slots });
            }
            Some(CloseAction::Pop) | None => {}
        }
        self.state.pop_element();
    }

    fn text(&mut self, text: &str) {
        if self.state.is_capturing() {
            self.state.capture_text(text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewriter::{Chunk, rewrite};
    use pretty_assertions::assert_eq;

    fn run(html: &str) -> (Vec<Chunk>, Vec<PendingInclude>) {
        let mut handler = PrimaryHandler::new();
        let chunks = rewrite(html, &mut handler);
        (chunks, handler.into_includes())
    }

    fn slots(pairs: &[(&str, &str)]) -> SlotMap {
        pairs
            .iter()
            .map(|(name, markup)| ((*name).to_owned(), (*markup).to_owned()))
            .collect()
    }

    #[test]
    fn test_include_tags_replaced_by_hole() {
        let (chunks, includes) = run(r#"<main><include path="/card.html"></include></main>"#);

        assert_eq!(
            chunks,
            vec![
                Chunk::Markup("<main>".to_owned()),
                Chunk::Deferred(0),
                Chunk::Markup("</main>".to_owned()),
            ]
        );
        assert_eq!(
            includes,
            vec![PendingInclude {
                path: "/card.html".to_owned(),
                slots: SlotMap::new(),
            }]
        );
    }

    #[test]
    fn test_fill_captured_and_content_suppressed() {
        let (chunks, includes) = run(
            r#"<include path="/card.html"><fill slot="body"><p class="lead">Para</p></fill></include>"#,
        );

        assert_eq!(chunks, vec![Chunk::Deferred(0)]);
        assert_eq!(
            includes[0].slots,
            slots(&[("body", r#"<p class="lead">Para</p>"#)])
        );
    }

    #[test]
    fn test_last_fill_for_name_wins() {
        let (_, includes) = run(
            r#"<include path="/card.html"><fill slot="t">A</fill><fill slot="t">B</fill></include>"#,
        );

        assert_eq!(includes[0].slots, slots(&[("t", "B")]));
    }

    #[test]
    fn test_multiple_slots_for_one_include() {
        let (_, includes) = run(concat!(
            r#"<include path="/card.html">"#,
            r#"<fill slot="title">Title</fill>"#,
            r#"<fill slot="body"><em>Body</em></fill>"#,
            "</include>",
        ));

        assert_eq!(
            includes[0].slots,
            slots(&[("title", "Title"), ("body", "<em>Body</em>")])
        );
    }

    #[test]
    fn test_include_without_path_passes_through() {
        let (chunks, includes) = run("<include><b>x</b></include>");

        assert_eq!(
            chunks,
            vec![Chunk::Markup("<include><b>x</b></include>".to_owned())]
        );
        assert!(includes.is_empty());
    }

    #[test]
    fn test_include_with_empty_path_passes_through() {
        let (chunks, includes) = run(r#"<include path="">x</include>"#);

        assert_eq!(
            chunks,
            vec![Chunk::Markup(r#"<include path="">x</include>"#.to_owned())]
        );
        assert!(includes.is_empty());
    }

    #[test]
    fn test_fill_without_slot_is_not_captured() {
        let (chunks, includes) = run(r#"<include path="/a.html"><fill>Leak</fill></include>"#);

        assert_eq!(chunks, vec![Chunk::Deferred(0)]);
        assert!(includes[0].slots.is_empty());
    }

    #[test]
    fn test_fill_outside_include_is_dropped() {
        let (chunks, includes) = run(r#"<div><fill slot="x">Lost</fill></div>"#);

        assert_eq!(chunks, vec![Chunk::Markup("<div>Lost</div>".to_owned())]);
        assert!(includes.is_empty());
    }

    #[test]
    fn test_fill_under_include_without_path_is_dropped() {
        let (chunks, includes) = run(r#"<include><fill slot="x">Hi</fill></include>"#);

        assert_eq!(
            chunks,
            vec![Chunk::Markup("<include>Hi</include>".to_owned())]
        );
        assert!(includes.is_empty());
    }

    #[test]
    fn test_text_outside_fill_is_not_captured() {
        let (_, includes) = run(r#"<include path="/a.html">loose<fill slot="x">kept</fill></include>"#);

        assert_eq!(includes[0].slots, slots(&[("x", "kept")]));
    }

    #[test]
    fn test_void_element_in_fill() {
        let (chunks, includes) =
            run(r#"<include path="/a.html"><fill slot="t">A<br>B</fill></include>"#);

        assert_eq!(chunks, vec![Chunk::Deferred(0)]);
        assert_eq!(includes[0].slots, slots(&[("t", "A<br></br>B")]));
    }

    #[test]
    fn test_nested_include_in_fill_is_not_expanded() {
        let (chunks, includes) = run(concat!(
            r#"<include path="/outer.html"><fill slot="body">"#,
            r#"<include path="/inner.html"><span>x</span></include>"#,
            "</fill></include>",
        ));

        // The inner include's hole is swallowed by the outer include...
        assert_eq!(chunks, vec![Chunk::Deferred(1)]);
        assert_eq!(includes[0].path, "/inner.html");
        // ...and it is captured as a plain element for the outer one.
        assert_eq!(includes[1].path, "/outer.html");
        assert_eq!(
            includes[1].slots,
            slots(&[(
                "body",
                r#"<include path="/inner.html"><span>x</span></include>"#
            )])
        );
    }

    #[test]
    fn test_sibling_same_path_includes_use_own_fills() {
        let (chunks, includes) = run(concat!(
            r#"<include path="/same.html"><fill slot="x">One</fill></include>"#,
            r#"<include path="/same.html"><fill slot="x">Two</fill></include>"#,
        ));

        assert_eq!(chunks, vec![Chunk::Deferred(0), Chunk::Deferred(1)]);
        assert_eq!(includes[0].slots, slots(&[("x", "One")]));
        assert_eq!(includes[1].slots, slots(&[("x", "Two")]));
    }

    #[test]
    fn test_nested_same_path_include_clears_shared_buffer() {
        let (_, includes) = run(concat!(
            r#"<include path="/same.html"><fill slot="x">Outer</fill>"#,
            r#"<include path="/same.html"></include>"#,
            "</include>",
        ));

        assert_eq!(includes.len(), 2);
        assert!(includes[0].slots.is_empty());
        assert!(includes[1].slots.is_empty());
    }

    #[test]
    fn test_fill_after_nested_same_path_include_lands_in_shared_buffer() {
        let (_, includes) = run(concat!(
            r#"<include path="/same.html">"#,
            r#"<include path="/same.html"></include>"#,
            r#"<fill slot="x">Outer</fill>"#,
            "</include>",
        ));

        assert!(includes[0].slots.is_empty());
        assert_eq!(includes[1].slots, slots(&[("x", "Outer")]));
    }

    #[test]
    fn test_directive_tags_case_insensitive() {
        let (chunks, includes) =
            run(r#"<INCLUDE PATH="/a.html"><Fill Slot="x">Hi</Fill></INCLUDE>"#);

        assert_eq!(chunks, vec![Chunk::Deferred(0)]);
        assert_eq!(includes[0].slots, slots(&[("x", "Hi")]));
    }

    #[test]
    fn test_include_content_outside_fills_never_emitted() {
        let (chunks, includes) = run(concat!(
            r#"<div><include path="/a.html">Loading..."#,
            r#"<p>placeholder</p><fill slot="x">kept</fill></include></div>"#,
        ));

        assert_eq!(
            chunks,
            vec![
                Chunk::Markup("<div>".to_owned()),
                Chunk::Deferred(0),
                Chunk::Markup("</div>".to_owned()),
            ]
        );
        assert_eq!(includes[0].slots, slots(&[("x", "kept")]));
    }
}
