#![forbid(unsafe_code)]

//! Reduced-motion accommodation.

use crate::config::PageConfig;
use crate::host::{Dom, MediaQueries};

/// Mark the body when the user prefers reduced motion.
///
/// Returns whether the class was applied. A failing query counts as "no
/// preference".
pub fn apply_reduced_motion<D: Dom>(
    dom: &D,
    media: &dyn MediaQueries,
    config: &PageConfig,
) -> bool {
    let reduce = match media.matches(&config.queries.reduced_motion) {
        Ok(reduce) => reduce,
        Err(_err) => {
            crate::debug!(error = %_err, "reduced motion query failed");
            false
        }
    };
    if !reduce {
        return false;
    }
    let Some(body) = dom.body() else {
        return false;
    };
    dom.add_class(&body, &config.classes.reduced_motion);
    crate::debug!(class = %config.classes.reduced_motion, "reduced motion applied");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryDom, MemoryMedia};

    #[test]
    fn applies_class_only_when_preferred() {
        let config = PageConfig::default();
        let dom = MemoryDom::new();
        assert!(!apply_reduced_motion(&dom, &MemoryMedia::new(), &config));
        assert!(dom.classes(dom.body_id()).is_empty());

        let media = MemoryMedia::new().matching("(prefers-reduced-motion: reduce)");
        assert!(apply_reduced_motion(&dom, &media, &config));
        assert!(dom.has_class(&dom.body_id(), "movimiento-reducido"));
    }

    #[test]
    fn missing_media_support_is_ignored() {
        let dom = MemoryDom::new();
        assert!(!apply_reduced_motion(
            &dom,
            &MemoryMedia::unavailable(),
            &PageConfig::default()
        ));
        assert!(dom.classes(dom.body_id()).is_empty());
    }
}
