use guessr_core::model::ItemId;

/// Slots a missed item is pushed forward in progressive mode.
pub const REQUEUE_DISTANCE: usize = 5;

/// Ordered items of the active session plus the cursor on the current one.
///
/// `cursor <= len()` always; the queue is complete when they are equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionQueue {
    items: Vec<ItemId>,
    cursor: usize,
}

impl SessionQueue {
    #[must_use]
    pub fn new(items: Vec<ItemId>) -> Self {
        Self { items, cursor: 0 }
    }

    #[must_use]
    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn current(&self) -> Option<ItemId> {
        self.items.get(self.cursor).copied()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.cursor >= self.items.len()
    }

    /// Move past the current item. Returns `true` if the queue is now complete.
    pub fn advance(&mut self) -> bool {
        if self.cursor < self.items.len() {
            self.cursor += 1;
        }
        self.is_complete()
    }

    /// Move the current item `REQUEUE_DISTANCE` slots forward.
    ///
    /// The reinsertion index is `min(cursor + REQUEUE_DISTANCE, len - 1)`, with `len`
    /// taken after removal, so near the end the item lands just before the last
    /// slot. The cursor stays put and the length is unchanged.
    /// Returns the index the item was reinserted at, `None` if the queue is complete.
    pub fn requeue_current(&mut self) -> Option<usize> {
        if self.is_complete() {
            return None;
        }
        let id = self.items.remove(self.cursor);
        let last = self.items.len().saturating_sub(1);
        let insert_pos = (self.cursor + REQUEUE_DISTANCE).min(last);
        self.items.insert(insert_pos, id);
        Some(insert_pos)
    }
}
