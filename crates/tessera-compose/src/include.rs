//! Include rendering: fetch a fragment and fill its slots.

use url::Url;

use crate::slots::substitute_slots;
use crate::source::{FetchError, FragmentSource};
use crate::state::SlotMap;

/// Marker left in place of an include that could not be rendered.
#[must_use]
pub fn failure_marker(path: &str) -> String {
    format!("<!-- Failed to include: {path} -->")
}

/// Render the include at `path`, resolved against `base`.
///
/// Never fails: any fetch error yields [`failure_marker`].
pub(crate) fn render_include(
    source: &dyn FragmentSource,
    path: &str,
    slots: &SlotMap,
    base: &Url,
) -> String {
    match fetch_fragment(source, path, base) {
        Ok(fragment) => {
            tracing::debug!(path, bytes = fragment.len(), "Fetched include");
            substitute_slots(&fragment, slots)
        }
        Err(err) => {
            tracing::warn!(path, error = %err, "Failed to include fragment");
            failure_marker(path)
        }
    }
}

fn fetch_fragment(
    source: &dyn FragmentSource,
    path: &str,
    base: &Url,
) -> Result<String, FetchError> {
    let url = base.join(path)?;
    source.fetch(&url)
}
