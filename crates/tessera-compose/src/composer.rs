//! Document composition.
//!
//! [`Composer::compose`] runs the primary pass over a document, renders every
//! include it found and splices the results back where the includes were.
//!
//! Include rendering is deferred to the end of the pass: each include leaves
//! a hole in the output together with a snapshot of its slot buffer taken at
//! the include's close. Holes swallowed by an enclosing include are dropped
//! unrendered. The remaining includes are fetched concurrently on a thread
//! pool owned by this call, one thread per include, and each result goes
//! into its own hole, so output order does not depend on fetch completion
//! order.
//!
//! The pool is never shared. A fragment fetched from the same server is
//! composed on that server by its own pool, so nested composition can't
//! starve outer fetches of threads.

use std::collections::HashMap;
use std::sync::Arc;

use rayon::prelude::*;
use url::Url;

use crate::include::{failure_marker, render_include};
use crate::primary::{PendingInclude, PrimaryHandler};
use crate::rewriter::{Chunk, rewrite};
use crate::source::FragmentSource;

/// Rendered markup keyed by hole index.
type Rendered = HashMap<usize, String>;

/// Composes HTML documents containing include directives.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use tessera_compose::{Composer, HttpSource};
///
/// let composer = Composer::new(Arc::new(HttpSource::default()));
/// let html = composer.compose(
///     r#"<include path="/card.html"><fill slot="title">Hi</fill></include>"#,
///     "https://example.com/index.html",
/// );
/// ```
#[derive(Clone)]
pub struct Composer {
    source: Arc<dyn FragmentSource>,
}

impl Composer {
    /// Create a composer fetching fragments from `source`.
    #[must_use]
    pub fn new(source: Arc<dyn FragmentSource>) -> Self {
        Self { source }
    }

    /// Compose `html`, resolving include paths against `base_url`.
    ///
    /// Never fails. An include that can't be rendered is replaced by a
    /// failure marker comment; if `base_url` itself is invalid every include
    /// is.
    #[must_use]
    pub fn compose(&self, html: &str, base_url: &str) -> String {
        let mut handler = PrimaryHandler::new();
        let chunks = rewrite(html, &mut handler);
        let includes = handler.into_includes();

        let holes: Vec<(usize, &PendingInclude)> = chunks
            .iter()
            .filter_map(|chunk| match chunk {
                Chunk::Deferred(index) => includes.get(*index).map(|include| (*index, include)),
                Chunk::Markup(_) => None,
            })
            .collect();

        if holes.is_empty() {
            return splice(chunks, &Rendered::new());
        }

        tracing::debug!(
            count = holes.len(),
            skipped = includes.len() - holes.len(),
            base_url,
            "Rendering includes"
        );
        let rendered = match Url::parse(base_url) {
            Ok(base) => self.render_all(&holes, &base),
            Err(err) => {
                tracing::warn!(base_url, error = %err, "Invalid base URL, includes not rendered");
                holes
                    .iter()
                    .map(|(index, include)| (*index, failure_marker(&include.path)))
                    .collect()
            }
        };

        splice(chunks, &rendered)
    }

    fn render_all(&self, holes: &[(usize, &PendingInclude)], base: &Url) -> Rendered {
        let source = self.source.as_ref();
        let render = |&(index, include): &(usize, &PendingInclude)| {
            (index, render_include(source, &include.path, &include.slots, base))
        };

        if holes.len() == 1 {
            return holes.iter().map(render).collect();
        }

        match rayon::ThreadPoolBuilder::new()
            .num_threads(holes.len())
            .thread_name(|index| format!("tessera-include-{index}"))
            .build()
        {
            Ok(pool) => pool.install(|| holes.par_iter().map(render).collect()),
            Err(err) => {
                tracing::warn!(error = %err, "Failed to create include pool, rendering sequentially");
                holes.iter().map(render).collect()
            }
        }
    }
}

/// Join output chunks, filling each hole from `rendered`.
fn splice(chunks: Vec<Chunk>, rendered: &Rendered) -> String {
    let mut html = String::new();
    for chunk in chunks {
        match chunk {
            Chunk::Markup(markup) => html.push_str(&markup),
            Chunk::Deferred(index) => {
                if let Some(markup) = rendered.get(&index) {
                    html.push_str(markup);
                }
            }
        }
    }
    html
}

/// Whether a `Content-Type` value denotes HTML.
#[must_use]
pub fn is_html(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("text/html")
}
