//! Slot substitution inside a fetched fragment.

use crate::rewriter::{StartTag, TagHandler, rewrite_to_string};
use crate::state::SlotMap;

struct SlotHandler<'a> {
    slots: &'a SlotMap,
}

impl TagHandler for SlotHandler<'_> {
    fn start_tag(&mut self, tag: &mut StartTag<'_>) {
        if tag.name() != "slot" {
            return;
        }
        match tag.get_attribute("name") {
            None => tag.remove(),
            Some(name) => {
                if let Some(markup) = self.slots.get(name) {
                    tag.replace(markup.as_str());
                }
            }
        }
    }
}

/// Replace the `<slot>` elements of `fragment` with captured slot markup.
///
/// - `<slot>` without a name is removed with its content
/// - `<slot name="x">` with `x` in `slots` is replaced, fallback content included
/// - any other `<slot>` is left as it is
#[must_use]
pub fn substitute_slots(fragment: &str, slots: &SlotMap) -> String {
    rewrite_to_string(fragment, &mut SlotHandler { slots })
}
