//! Fixed-size-page result-set storage (spec.md §9 design note: "Fixed-size
//! pages from a mempool avoid reallocation and allow the cursor to be a
//! `(page, index)` pair. The read cursor can be reset without
//! reallocating."). New module (no close teacher analogue); grounded on
//! that design note's explicit cursor shape, with `arena.rs`'s slab style
//! reused for page storage instead of a growing `Vec`.

use crate::ids::RecordId;
use crate::options::QUERY_PAGE_SIZE;

struct Page {
    slots: [RecordId; QUERY_PAGE_SIZE],
    len: usize,
}

impl Page {
    fn empty() -> Self {
        Page {
            slots: [RecordId::NIL; QUERY_PAGE_SIZE],
            len: 0,
        }
    }
}

/// A `(page, index)` read/write position into a [`ResultSet`], per the
/// design note. Resetting to `ResultSet::start()` rewinds without
/// touching the underlying pages.
pub type Position = (usize, usize);

/// A materialised result set built from fixed-size pages instead of one
/// growing buffer (spec.md §4.5 "prefetch variant"). Every query's
/// executed plan pushes record handles here; callers read them back
/// through an independent, rewindable [`Position`].
#[derive(Default)]
pub struct ResultSet {
    pages: Vec<Page>,
    len: usize,
}

impl ResultSet {
    pub fn new() -> Self {
        ResultSet::default()
    }

    pub fn push(&mut self, rid: RecordId) {
        if self.pages.last().map(|p| p.len == QUERY_PAGE_SIZE).unwrap_or(true) {
            self.pages.push(Page::empty());
        }
        let page = self.pages.last_mut().expect("just pushed if needed");
        page.slots[page.len] = rid;
        page.len += 1;
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn start(&self) -> Position {
        (0, 0)
    }

    /// Advances `pos` and returns the record at the pre-advance position,
    /// or `None` once every page is exhausted.
    pub fn fetch(&self, pos: &mut Position) -> Option<RecordId> {
        loop {
            let page = self.pages.get(pos.0)?;
            if pos.1 < page.len {
                let rid = page.slots[pos.1];
                pos.1 += 1;
                return Some(rid);
            }
            pos.0 += 1;
            pos.1 = 0;
        }
    }
}

#[cfg(test)]
#[path = "mempool_test.rs"]
mod mempool_test;
