//! Navigator: the query capability the engine consumes
//!
//! A navigator is a handle onto zero or more located elements. The engine never
//! runs queries itself; it only asks navigators to narrow, index and split, and
//! uses them as the root of further queries. Pages and modules implement the
//! trait too, delegating to their base.

use std::sync::Arc;

/// Shared, type-erased navigator handle
pub type NavigatorRef = Arc<dyn Navigator>;

/// Queryable handle onto located elements
///
/// Errors are whatever the transport layer reports; the engine wraps them with
/// the failing content's name but keeps them as the error source.
pub trait Navigator: Send + Sync {
    /// Query descendants of every element in this handle
    fn find(&self, selector: &str) -> anyhow::Result<NavigatorRef>;

    /// Keep only the elements that themselves match `selector`
    fn filter(&self, selector: &str) -> anyhow::Result<NavigatorRef>;

    /// The element at `index`, or an empty handle when out of range
    fn at(&self, index: usize) -> anyhow::Result<NavigatorRef>;

    /// Number of matched elements
    fn size(&self) -> anyhow::Result<usize>;

    /// One single-element handle per match, in document order
    fn as_sequence(&self) -> anyhow::Result<Vec<NavigatorRef>>;

    fn is_empty(&self) -> anyhow::Result<bool> {
        Ok(self.size()? == 0)
    }
}

/// Access to the document root
pub trait Document: Send + Sync {
    fn root(&self) -> NavigatorRef;
}
