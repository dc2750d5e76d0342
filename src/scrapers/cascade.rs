//! Ordered selector fallbacks.
//!
//! A cascade lists lookups from most to least specific: current markup
//! classes first, `data-testid` attributes next, generic structure last.
//! Every lookup in the crate walks its cascade through [`try_in_order`].

use std::fmt;
use std::future::Future;

use tracing::trace;

/// Ordered list of CSS selectors. The first one that yields a result wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectorCascade(Vec<String>);

impl SelectorCascade {
    pub fn new<I, S>(selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(selectors.into_iter().map(Into::into).collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Combine into a single selector group (`a, b, c`) matching any member.
    pub fn as_group(&self) -> String {
        self.0.join(", ")
    }
}

impl fmt::Display for SelectorCascade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(" | "))
    }
}

impl<S: Into<String>> FromIterator<S> for SelectorCascade {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Probe each candidate in order and return the first hit.
///
/// A probe signals "no usable result" with `None`; the next candidate is
/// then tried. Evaluation stops at the first `Some`.
pub async fn try_in_order<'a, I, T, F, Fut>(candidates: I, mut probe: F) -> Option<T>
where
    I: IntoIterator<Item = &'a str>,
    F: FnMut(&'a str) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for candidate in candidates {
        if let Some(hit) = probe(candidate).await {
            return Some(hit);
        }
        trace!("Cascade candidate produced nothing: {}", candidate);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[tokio::test]
    async fn first_hit_wins_and_short_circuits() {
        let cascade = SelectorCascade::new(["a", "b", "c"]);
        let probed = RefCell::new(Vec::new());

        let hit = try_in_order(cascade.iter(), |sel| {
            probed.borrow_mut().push(sel.to_string());
            let result = (sel == "b").then(|| sel.to_uppercase());
            async move { result }
        })
        .await;

        assert_eq!(hit.as_deref(), Some("B"));
        assert_eq!(*probed.borrow(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn exhausted_cascade_is_none() {
        let cascade = SelectorCascade::new(["x", "y"]);
        let hit: Option<()> = try_in_order(cascade.iter(), |_| async { None }).await;
        assert!(hit.is_none());
    }

    #[tokio::test]
    async fn empty_cascade_is_none() {
        let cascade = SelectorCascade::default();
        let hit: Option<u8> = try_in_order(cascade.iter(), |_| async { Some(1) }).await;
        assert!(hit.is_none());
    }

    #[test]
    fn group_joins_with_commas() {
        let cascade = SelectorCascade::new(["div.a", "div[data-testid=\"b\"]"]);
        assert_eq!(cascade.as_group(), "div.a, div[data-testid=\"b\"]");
    }
}
