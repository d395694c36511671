//! Pagination policies for multi-page listings.
//!
//! A policy instance belongs to exactly one listing. The collector asks it
//! for page sizes and whether to fetch another page; the listing's transform
//! runs each page through `iterate` on the policy, which is where item
//! budgets are spent.

use parking_lot::Mutex;
use std::fmt;

/// Verdict for one listed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Consume the item without keeping it (page offset)
    Skip,
    /// Keep the item
    Keep,
    /// Budget spent; discard this item and the rest of the page
    Stop,
}

pub trait PaginationPolicy: Send + Sync + fmt::Debug {
    /// Page size for the next request, at most `max`.
    fn next_list_size(&self, max: u32) -> u32;

    /// Whether another page should be requested after the current one.
    fn should_continue(&self) -> bool;

    /// Decide what happens to the next item in listing order.
    fn admit(&self) -> Admission;

    /// Whether items were discarded after the budget ran out.
    fn has_more(&self) -> bool {
        false
    }
}

impl<'a> dyn PaginationPolicy + 'a {
    /// Visit the admitted items of one page in order, stopping early once the
    /// policy's budget is spent.
    pub fn iterate<I, F>(&self, items: I, mut visit: F)
    where
        I: IntoIterator,
        F: FnMut(I::Item),
    {
        for item in items {
            match self.admit() {
                Admission::Skip => continue,
                Admission::Keep => visit(item),
                Admission::Stop => return,
            }
        }
    }
}

/// Keeps every item and follows every page.
#[derive(Debug, Default, Clone, Copy)]
pub struct InfinitePagination;

impl InfinitePagination {
    pub fn new() -> Self {
        Self
    }
}

impl PaginationPolicy for InfinitePagination {
    fn next_list_size(&self, max: u32) -> u32 {
        max
    }

    fn should_continue(&self) -> bool {
        true
    }

    fn admit(&self) -> Admission {
        Admission::Keep
    }
}

#[derive(Debug)]
struct Budget {
    to_skip: u32,
    to_show: u32,
    has_more: bool,
}

/// Skips an offset, keeps a fixed number of items, then stops.
#[derive(Debug)]
pub struct BoundedPagination {
    budget: Mutex<Budget>,
}

impl BoundedPagination {
    /// Keep at most `limit` items from the start of the listing.
    pub fn new(limit: u32) -> Self {
        Self::with_offset(0, limit)
    }

    /// Keep page `page` (1-based) of a listing split into pages of `page_size`.
    pub fn page(page: u32, page_size: u32) -> Self {
        let to_skip = page_size.saturating_mul(page.saturating_sub(1));
        Self::with_offset(to_skip, page_size)
    }

    fn with_offset(to_skip: u32, to_show: u32) -> Self {
        Self {
            budget: Mutex::new(Budget {
                to_skip,
                to_show,
                has_more: false,
            }),
        }
    }

    /// Items still to be kept.
    pub fn remaining(&self) -> u32 {
        self.budget.lock().to_show
    }
}

impl PaginationPolicy for BoundedPagination {
    fn next_list_size(&self, max: u32) -> u32 {
        let budget = self.budget.lock();
        max.min(budget.to_skip.saturating_add(budget.to_show))
    }

    fn should_continue(&self) -> bool {
        self.budget.lock().to_show > 0
    }

    fn admit(&self) -> Admission {
        let mut budget = self.budget.lock();
        if budget.to_skip > 0 {
            budget.to_skip -= 1;
            Admission::Skip
        } else if budget.to_show > 0 {
            budget.to_show -= 1;
            Admission::Keep
        } else {
            budget.has_more = true;
            Admission::Stop
        }
    }

    fn has_more(&self) -> bool {
        self.budget.lock().has_more
    }
}
