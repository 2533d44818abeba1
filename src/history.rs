//! Back/forward stack of locations, modelled on a browser session history.
//!
//! The entry under the cursor is the "address bar". A successful load moves
//! the history according to its [`NavIntent`]; failed loads leave it alone.

use log::debug;

use crate::location::Location;

/// How a load should affect history once it succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavIntent {
    /// First load from a location that already names a poem. Skip-push.
    Initial,
    /// Rewrite the current entry (first random load becomes linkable).
    Replace,
    /// Add a new entry after the current one.
    Push,
    /// Back/forward restore: the entry is already current. Skip-push.
    PopStateRestore,
}

#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Location>,
    cursor: usize,
}

impl History {
    pub fn new(initial: Location) -> Self {
        Self {
            entries: vec![initial],
            cursor: 0,
        }
    }

    pub fn current(&self) -> &Location {
        &self.entries[self.cursor]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_go_back(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Record a successful load of `location`.
    pub fn apply(&mut self, intent: NavIntent, location: Location) {
        match intent {
            NavIntent::Initial | NavIntent::PopStateRestore => {}
            NavIntent::Replace => {
                debug!("history: replace {} → {}", self.current(), location);
                self.entries[self.cursor] = location;
            }
            NavIntent::Push => {
                if *self.current() == location {
                    debug!("history: {location} already current, not pushing");
                    return;
                }
                self.entries.truncate(self.cursor + 1);
                self.entries.push(location);
                self.cursor += 1;
                debug!(
                    "history: push {} (depth {})",
                    self.current(),
                    self.entries.len()
                );
            }
        }
    }

    /// Step back one entry and return the location to restore.
    pub fn back(&mut self) -> Option<&Location> {
        if !self.can_go_back() {
            return None;
        }
        self.cursor -= 1;
        Some(self.current())
    }

    /// Step forward one entry and return the location to restore.
    pub fn forward(&mut self) -> Option<&Location> {
        if !self.can_go_forward() {
            return None;
        }
        self.cursor += 1;
        Some(self.current())
    }
}
