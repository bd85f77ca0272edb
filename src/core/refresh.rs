//! Stale-fetch protection for views that reload when their selected period changes.
//!
//! Every load takes a [`FetchTicket`] from the view's [`FetchGeneration`] before it
//! touches the store. When the load finishes its result is kept only if no newer ticket
//! was issued in the meantime; otherwise it is dropped, so a slow response for an old
//! selection can never overwrite the current one.

use crate::{
    core::{
        budget::{BudgetTracker, budget_tracker},
        payment::{PeriodCollection, period_collection},
        period::Period,
    },
    errors::Result,
};
use sea_orm::DatabaseConnection;
use std::{
    future::Future,
    sync::atomic::{AtomicU64, Ordering},
};
use tracing::debug;

/// Request-generation counter for one view.
#[derive(Debug, Default)]
pub struct FetchGeneration {
    latest: AtomicU64,
}

/// Identifies one issued load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

impl FetchGeneration {
    /// Creates a counter with no tickets issued.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new load, superseding every ticket issued before it.
    pub fn issue(&self) -> FetchTicket {
        FetchTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether `ticket` is still the most recently issued one.
    #[must_use]
    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Returns `value` if `ticket` is still current, `None` if it has been superseded.
    pub fn accept<T>(&self, ticket: FetchTicket, value: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(value)
        } else {
            debug!(ticket = ticket.0, "Discarding superseded fetch result");
            None
        }
    }

    /// Issues a ticket, awaits `load` and keeps its result only if still current.
    ///
    /// Errors are returned whether or not the load was superseded.
    pub async fn run<T, F>(&self, load: F) -> Result<Option<T>>
    where
        F: Future<Output = Result<T>>,
    {
        let ticket = self.issue();
        let value = load.await?;
        Ok(self.accept(ticket, value))
    }
}

/// Budget tracker screen with a changeable period.
#[derive(Debug, Default)]
pub struct BudgetView {
    generation: FetchGeneration,
}

impl BudgetView {
    /// Creates a view with no load in flight.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the tracker for `period`; `None` if another load started meanwhile.
    pub async fn load(
        &self,
        db: &DatabaseConnection,
        period: Period,
    ) -> Result<Option<BudgetTracker>> {
        self.generation.run(budget_tracker(db, period)).await
    }
}

/// Payments screen with a changeable period.
#[derive(Debug, Default)]
pub struct PaymentView {
    generation: FetchGeneration,
}

impl PaymentView {
    /// Creates a view with no load in flight.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the payments of `period`; `None` if another load started meanwhile.
    pub async fn load(
        &self,
        db: &DatabaseConnection,
        period: Period,
    ) -> Result<Option<PeriodCollection>> {
        self.generation.run(period_collection(db, period)).await
    }
}
