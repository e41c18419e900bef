//! Page walking for GitHub listings.
//!
//! A `Paginator` combines two independent policies: a `PageLimit` deciding how
//! many pages may be read, and a `CancelFlag` checked at every item and page
//! boundary. Cancellation is a soft stop: whatever was gathered so far is
//! returned as a successful result.

use async_trait::async_trait;
use std::fmt::Display;
use std::future::Future;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::github::Page;

/// Shared interruption signal, set once by the interrupt handler.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How many pages a paginator may read before stopping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageLimit {
    #[default]
    Unlimited,
    MaxPages(usize),
}

impl PageLimit {
    /// Dev mode reads only the first page.
    pub fn for_dev_mode(dev_mode: bool) -> Self {
        if dev_mode {
            PageLimit::MaxPages(1)
        } else {
            PageLimit::Unlimited
        }
    }

    fn reached(self, pages_read: usize) -> bool {
        match self {
            PageLimit::Unlimited => false,
            PageLimit::MaxPages(max) => pages_read >= max,
        }
    }
}

/// Receives the items of a walk one at a time.
#[async_trait]
pub trait ItemVisitor<T: Send + 'static>: Send {
    type Error: Display + Send;

    async fn visit(&mut self, item: T) -> Result<(), Self::Error>;
}

/// Outcome of a `Paginator::walk`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    pub pages: usize,
    pub visited: usize,
    pub skipped: usize,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Paginator {
    limit: PageLimit,
    cancel: CancelFlag,
}

impl Paginator {
    pub fn new(limit: PageLimit, cancel: CancelFlag) -> Self {
        Self { limit, cancel }
    }

    /// Read pages until the source runs out, the limit is reached, or the
    /// cancel flag is raised, returning every item in source order.
    pub async fn collect<T, E, F, Fut>(&self, mut fetch: F) -> Result<Vec<T>, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Page<T>, E>>,
    {
        let mut results = Vec::new();
        let mut page = 1;
        let mut pages_read = 0;

        loop {
            let batch = fetch(page).await?;
            pages_read += 1;
            results.extend(batch.items);

            if self.cancel.is_cancelled() {
                debug!(pages_read, items = results.len(), "cancelled, keeping partial listing");
                break;
            }
            if self.limit.reached(pages_read) {
                break;
            }
            match advance(page, batch.next_page) {
                Some(next) => page = next,
                None => break,
            }
        }

        Ok(results)
    }

    /// Hand every item to `visitor` without materializing the listing.
    ///
    /// A page fetch error aborts the walk. A visitor error is logged and the
    /// item skipped.
    pub async fn walk<T, E, F, Fut, V>(
        &self,
        mut fetch: F,
        visitor: &mut V,
    ) -> Result<WalkSummary, E>
    where
        T: Send + 'static,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Page<T>, E>>,
        V: ItemVisitor<T> + ?Sized,
    {
        let mut summary = WalkSummary::default();
        let mut progress = Progress::stderr();
        let mut page = 1;

        loop {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let batch = fetch(page).await?;
            summary.pages += 1;
            let next_page = batch.next_page;

            for item in batch.items {
                match visitor.visit(item).await {
                    Ok(()) => {
                        summary.visited += 1;
                        progress.tick();
                    }
                    Err(e) => {
                        summary.skipped += 1;
                        warn!(error = %e, "could not process item, skipping");
                    }
                }

                if self.cancel.is_cancelled() {
                    summary.cancelled = true;
                    break;
                }
            }
            if summary.cancelled {
                break;
            }

            if self.limit.reached(summary.pages) {
                info!(pages = summary.pages, "page limit reached, shortcutting");
                break;
            }
            match advance(page, next_page) {
                Some(next) => page = next,
                None => break,
            }
        }

        progress.finish();
        if summary.cancelled {
            info!(visited = summary.visited, "stopping");
        }
        Ok(summary)
    }
}

/// Page to read after `current`, or `None` at the end of the listing.
/// A next page that does not move forward ends the listing.
fn advance(current: u32, next_page: Option<u32>) -> Option<u32> {
    match next_page {
        Some(next) if next > current => Some(next),
        Some(next) => {
            warn!(current, next, "next page does not advance, stopping");
            None
        }
        None => None,
    }
}

/// One dot per processed item on the diagnostic stream.
struct Progress<W: Write> {
    out: W,
    ticks: usize,
}

impl Progress<io::Stderr> {
    fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> Progress<W> {
    fn new(out: W) -> Self {
        Self { out, ticks: 0 }
    }

    fn tick(&mut self) {
        self.ticks += 1;
        let _ = write!(self.out, ".");
        let _ = self.out.flush();
    }

    fn finish(&mut self) {
        if self.ticks > 0 {
            let _ = writeln!(self.out);
        }
    }
}
