//! HTML composition with include, fill and slot directives.
//!
//! A page pulls in a fragment with `<include path="...">` and passes markup
//! into the fragment's named `<slot>` elements with `<fill slot="...">`:
//!
//! ```html
//! <include path="/components/card.html">
//!   <fill slot="title">Welcome</fill>
//! </include>
//! ```
//!
//! Fragments are fetched through a [`FragmentSource`], relative to the
//! document's URL. A failed fetch leaves a comment in place of the include
//! and never fails the document.
//!
//! # Architecture
//!
//! The crate is organized into modules:
//! - `node`: Arena of captured nodes (`Arena`, `Node`, `NodeId`)
//! - `serialize`: Markup serialization of captured nodes
//! - `tokenizer`: Lenient HTML tokenizer over `quick-xml`
//! - `rewriter`: Streaming rewriter driving tag handlers
//! - `state`: Composition state (open elements, fill captures, slot buffers)
//! - `primary`: Directive dispatch for the primary document
//! - `slots`: Slot substitution in fetched fragments
//! - `include`: Include rendering with failure markers
//! - `source`: Fragment sources (`HttpSource`, `MemorySource`)
//! - `composer`: `Composer` tying the passes together
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tessera_compose::{Composer, HttpSource};
//!
//! let composer = Composer::new(Arc::new(HttpSource::default()));
//! let html = composer.compose(page, "https://example.com/index.html");
//! ```

mod composer;
mod include;
mod node;
mod primary;
mod rewriter;
mod serialize;
mod slots;
mod source;
mod state;
mod tokenizer;

pub use composer::{Composer, is_html};
pub use include::failure_marker;
pub use node::{Arena, Attributes, Node, NodeId};
pub use serialize::serialize;
pub use slots::substitute_slots;
#[cfg(any(test, feature = "mock"))]
pub use source::MemorySource;
pub use source::{DEFAULT_TIMEOUT, FetchError, FragmentSource, HttpSource};
pub use state::SlotMap;
