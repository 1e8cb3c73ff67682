//! Structured document abstraction used by the inline walker
//!
//! A document is a tree of items. Every item has one or more key labels,
//! zero or more child items, and zero or more scalar string leaves. The walker
//! only ever navigates by label, reads leaf values, and replaces them, so any
//! format that can re-serialize itself with untouched regions preserved can
//! sit behind this trait.

/// Handle to an item inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub(crate) usize);

/// Handle to a scalar string leaf inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LeafId(pub(crate) usize);

pub trait Document {
    /// Items at the root of the document, in document order.
    fn top_level(&self) -> &[ItemId];

    /// Key labels of an item as spelled in the source. `secret "x" { ... }`
    /// has the labels `secret` and `"x"`.
    fn labels(&self, item: ItemId) -> &[String];

    /// Child items nested under an item, in document order.
    fn children(&self, item: ItemId) -> &[ItemId];

    /// String leaves carried directly by an item's value.
    fn leaves(&self, item: ItemId) -> &[LeafId];

    /// The current (decoded) value of a leaf.
    fn leaf_value(&self, leaf: LeafId) -> &str;

    /// Replace a leaf's value. Quoting and escaping are the document's job.
    fn set_leaf_value(&mut self, leaf: LeafId, value: &str);

    /// Serialize the document. Regions that were not replaced come out
    /// byte-for-byte as they went in.
    fn render(&self) -> String;

    /// Whether any of the item's labels equals `label`.
    fn has_label(&self, item: ItemId, label: &str) -> bool {
        self.labels(item).iter().any(|l| l == label)
    }
}
