//! Ordered log of completed exchanges with a movable cursor.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{Credentials, Proxy};
use crate::error::{Direction, Error, Result};
use crate::http::{Method, RequestDictionary, Response};

/// One completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub uri: Url,
    pub method: Method,
    pub payload: RequestDictionary,
    pub response: Response,
    /// Index of the entry the session was on when this one was requested.
    pub previous: Option<usize>,
    pub credentials: Option<Credentials>,
    pub proxy: Option<Proxy>,
}

/// A resolved hop between two entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Hop {
    pub direction: Direction,
    pub steps: usize,
    pub from: usize,
    pub to: usize,
}

/// Append-only history. The cursor always points inside `[0, len - 1]`
/// once the first entry has been added.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<Entry>,
    cursor: usize,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and move the cursor onto it.
    pub fn add(&mut self, entry: Entry) {
        self.entries.push(entry);
        self.cursor = self.entries.len() - 1;
    }

    pub fn current(&self) -> Option<&Entry> {
        self.entries.get(self.cursor)
    }

    /// Index of the current entry; `None` while empty.
    pub fn index(&self) -> Option<usize> {
        (!self.entries.is_empty()).then_some(self.cursor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Where `steps` would land, without moving the cursor.
    ///
    /// Redirect entries at the landing position are skipped by continuing in
    /// the direction of travel while the walk stays in bounds.
    pub fn resolve(&self, steps: isize) -> Result<Hop> {
        let direction = if steps < 0 {
            Direction::Back
        } else {
            Direction::Forward
        };
        let requested = steps.unsigned_abs();

        if steps == 0 {
            return Err(Error::InvalidArgument(
                "The number of steps to navigate can't be zero.".to_string(),
            ));
        }

        let available = match direction {
            Direction::Back => self.index().unwrap_or(0),
            Direction::Forward => self
                .index()
                .map(|cursor| self.entries.len() - 1 - cursor)
                .unwrap_or(0),
        };
        if self.entries.is_empty() || requested > available {
            return Err(Error::OutOfRange {
                direction,
                requested,
                available,
            });
        }

        let mut target = match direction {
            Direction::Back => self.cursor - requested,
            Direction::Forward => self.cursor + requested,
        };
        while self.entries[target].response.is_redirect() {
            let next = match direction {
                Direction::Back => target.checked_sub(1),
                Direction::Forward => Some(target + 1).filter(|t| *t < self.entries.len()),
            };
            match next {
                Some(next) => target = next,
                None => break,
            }
        }

        Ok(Hop {
            direction,
            steps: requested,
            from: self.cursor,
            to: target,
        })
    }

    /// Move the cursor by `steps` (negative is back), skipping redirects.
    pub fn navigate(&mut self, steps: isize) -> Result<Hop> {
        let hop = self.resolve(steps)?;
        self.cursor = hop.to;
        Ok(hop)
    }
}
