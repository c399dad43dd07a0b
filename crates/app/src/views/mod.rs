//! View models.
//!
//! Each view owns its state behind a lock, runs its requests through the
//! record access layer, and renders itself as text. Nothing here knows about
//! the terminal.

pub mod dashboard;
pub mod layout;
pub mod login;
pub mod patient_detail;
pub mod patient_form;
pub mod patient_list;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Local, NaiveDate, Utc};
use thiserror::Error;

pub use dashboard::{DashboardStats, DashboardView};
pub use login::LoginView;
pub use patient_detail::PatientDetailView;
pub use patient_form::PatientFormView;
pub use patient_list::PatientListView;

/// Why a submission did not go through.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// Rejected before any request was made.
    #[error("{0}")]
    Invalid(String),

    /// A previous submission is still in flight.
    #[error("operation already in progress")]
    Busy,

    /// The backend call failed; the message is what the view shows.
    #[error("{0}")]
    Failed(String),
}

/// A loading/saving flag that can only be held by one operation at a time.
#[derive(Debug, Default)]
pub struct InFlight(AtomicBool);

impl InFlight {
    /// Take the flag, or `None` if another operation holds it.
    pub fn try_begin(&self) -> Option<InFlightGuard<'_>> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(&self.0))
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Releases the flag on drop, including when the owning future is dropped.
#[derive(Debug)]
pub struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// `dd/mm/yyyy`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Local calendar date of an instant, `dd/mm/yyyy`.
pub fn format_local_date(at: DateTime<Utc>) -> String {
    format_date(at.with_timezone(&Local).date_naive())
}

/// Local date and time of an instant, `dd/mm/yyyy, HH:MM:SS`.
pub fn format_local_date_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local)
        .format("%d/%m/%Y, %H:%M:%S")
        .to_string()
}
