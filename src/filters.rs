//! Filter store: the canonical filter spec, its invariants and its persistence.
//!
//! Every mutation updates the in-memory spec first, then writes the record
//! (best effort) and finally notifies subscribers with the new spec.

use std::collections::BTreeSet;

use chrono::{Local, NaiveDate};
use tracing::debug;

use crate::data::{
    load_filters, save_filters, DateRange, FilterSpec, RecordStore, RepoId, SquadId, UserId,
    DEFAULT_RANGE_DAYS,
};
use crate::error::FilterError;

/// Callback invoked with the new spec after every mutation
pub type FilterListener = Box<dyn FnMut(&FilterSpec)>;

/// Handle returned by [`FilterStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct FilterStore {
    spec: FilterSpec,
    records: Box<dyn RecordStore>,
    today: Box<dyn Fn() -> NaiveDate>,
    listeners: Vec<(SubscriptionId, FilterListener)>,
    next_subscription: u64,
}

impl FilterStore {
    /// Restore the store from `records`, using the local calendar date as today
    pub fn load(records: impl RecordStore + 'static) -> Self {
        Self::load_with_clock(records, || Local::now().date_naive())
    }

    /// Restore the store with an explicit source for today's date
    pub fn load_with_clock(
        records: impl RecordStore + 'static,
        today: impl Fn() -> NaiveDate + 'static,
    ) -> Self {
        let spec = load_filters(&records, today());
        debug!(?spec, "Restored filters");
        FilterStore {
            spec,
            records: Box::new(records),
            today: Box::new(today),
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    pub fn has_active_filters(&self) -> bool {
        self.spec.has_active_filters()
    }

    /// Register a listener for spec changes
    pub fn subscribe(&mut self, listener: impl FnMut(&FilterSpec) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub fn set_date_range(&mut self, range: Option<DateRange>) {
        self.spec.apply_date_range(range);
        self.commit();
    }

    /// Set the range from raw bounds, rejecting `start > end` without mutating
    pub fn set_date_bounds(&mut self, start: NaiveDate, end: NaiveDate) -> Result<(), FilterError> {
        let range = DateRange::new(start, end)?;
        self.set_date_range(Some(range));
        Ok(())
    }

    /// Set the range to the last `days` days ending today
    pub fn set_date_range_preset(&mut self, days: u32) {
        let range = DateRange::last_days((self.today)(), days);
        self.set_date_range(Some(range));
    }

    pub fn set_repositories<I>(&mut self, ids: Option<I>)
    where
        I: IntoIterator<Item = RepoId>,
    {
        let ids: Option<BTreeSet<RepoId>> = ids.map(|ids| ids.into_iter().collect());
        self.spec.apply_repositories(ids);
        self.commit();
    }

    /// Select a squad; a selected user is cleared in the same transition
    pub fn set_squad(&mut self, squad: Option<SquadId>) {
        self.spec.apply_squad(squad);
        self.commit();
    }

    /// Select a user; a selected squad is cleared in the same transition
    pub fn set_user(&mut self, user: Option<UserId>) {
        self.spec.apply_user(user);
        self.commit();
    }

    /// Drop repository/squad/user selections and restore the default date range
    pub fn clear(&mut self) {
        self.spec = FilterSpec::default().with_date_range(Some(DateRange::last_days(
            (self.today)(),
            DEFAULT_RANGE_DAYS,
        )));
        self.commit();
    }

    fn commit(&mut self) {
        save_filters(self.records.as_ref(), &self.spec);
        for (_, listener) in self.listeners.iter_mut() {
            listener(&self.spec);
        }
    }
}
