//! Fiscal year registry: date resolution and period closing

use chrono::{Datelike, NaiveDate};
use tracing::info;

use crate::traits::{EntryFilter, LedgerStorage};
use crate::types::*;

/// Registry of fiscal years, the periods entries are bucketed into
pub struct FiscalYearRegistry<S: LedgerStorage> {
    storage: S,
}

impl<S: LedgerStorage> FiscalYearRegistry<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Create a new open fiscal year. Overlapping ranges are not prevented;
    /// containment lookups break ties deterministically (lowest year wins).
    pub async fn create(
        &mut self,
        year: i32,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> LedgerResult<FiscalYear> {
        if start_date > end_date {
            return Err(LedgerError::Validation(format!(
                "fiscal year {year}: start date {start_date} is after end date {end_date}"
            )));
        }
        if self.storage.get_fiscal_year(year).await?.is_some() {
            return Err(LedgerError::Validation(format!(
                "fiscal year {year} already exists"
            )));
        }
        let fiscal_year = FiscalYear::new(year, start_date, end_date);
        self.storage.save_fiscal_year(&fiscal_year).await?;
        Ok(fiscal_year)
    }

    /// Get a fiscal year by its year label
    pub async fn get(&self, year: i32) -> LedgerResult<Option<FiscalYear>> {
        self.storage.get_fiscal_year(year).await
    }

    /// Get a fiscal year by its year label, erroring when absent
    pub async fn get_required(&self, year: i32) -> LedgerResult<FiscalYear> {
        self.storage
            .get_fiscal_year(year)
            .await?
            .ok_or(LedgerError::FiscalYearNotFound(year))
    }

    /// List all fiscal years ordered by year
    pub async fn list(&self) -> LedgerResult<Vec<FiscalYear>> {
        self.storage.list_fiscal_years().await
    }

    /// Resolve the fiscal year for a date.
    ///
    /// Order: (a) the year whose [start_date, end_date] range contains the
    /// date, lowest `year` winning when ranges overlap; (b) the year whose
    /// label equals the calendar year of the date, regardless of range.
    /// `None` means no eligible period exists; callers needing one surface
    /// that as `NoFiscalYear`.
    pub async fn for_date(&self, date: NaiveDate) -> LedgerResult<Option<FiscalYear>> {
        let years = self.storage.list_fiscal_years().await?;

        if let Some(containing) = years.iter().find(|fy| fy.contains(date)) {
            return Ok(Some(containing.clone()));
        }

        Ok(years.into_iter().find(|fy| fy.year == date.year()))
    }

    /// Close a fiscal year. One-way: closing an already-closed year is a
    /// no-op. Rejected while unposted entries remain in the year so that
    /// nothing postable gets stranded in a closed period.
    pub async fn close(&mut self, year: i32) -> LedgerResult<FiscalYear> {
        let mut fiscal_year = self.get_required(year).await?;
        if fiscal_year.is_closed {
            return Ok(fiscal_year);
        }

        let unposted = self
            .storage
            .count_entries(&EntryFilter::unposted_in_year(year))
            .await?;
        if unposted > 0 {
            return Err(LedgerError::Validation(format!(
                "fiscal year {year} still has {unposted} unposted entries"
            )));
        }

        fiscal_year.is_closed = true;
        self.storage.save_fiscal_year(&fiscal_year).await?;
        info!(year, "fiscal year closed");
        Ok(fiscal_year)
    }
}
