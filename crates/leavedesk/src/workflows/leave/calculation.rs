//! Vacation balance arithmetic for a single yearly account.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::calendar::{CalendarError, WorkCalendar};
use super::domain::{Account, ApplicationStatus, DateRange, LeaveApplication};
use super::policy::CarryOverCutoff;

/// Snapshot of an account's balance as of a reference date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacationBalance {
    pub year: i32,
    pub vacation_days: Decimal,
    pub remaining_vacation_days: Decimal,
    pub used_days: Decimal,
    pub left_vacation_days: Decimal,
    pub left_remaining_vacation_days: Decimal,
    pub total_left_vacation_days: Decimal,
    /// Whether the reference date lies before the carry-over cut-off.
    pub before_cutoff: bool,
}

/// Result of checking whether a new request fits into the affected accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceCheck {
    Sufficient,
    MissingAccount { year: i32 },
    Insufficient { year: i32, left_vacation_days: Decimal },
}

#[derive(Debug, Clone, Copy)]
struct Usage {
    total: Decimal,
    before_cutoff: Decimal,
}

/// Computes left vacation days and the remaining (carry-over) days.
///
/// Carry-over days are consumed first, by every holiday day when they do not expire and
/// only by days before the cut-off when they do.
#[derive(Debug, Clone, Copy, Default)]
pub struct BalanceCalculator {
    cutoff: CarryOverCutoff,
}

impl BalanceCalculator {
    pub fn new(cutoff: CarryOverCutoff) -> Self {
        Self { cutoff }
    }

    pub fn balance(
        &self,
        account: &Account,
        applications: &[LeaveApplication],
        calendar: &WorkCalendar,
        today: NaiveDate,
    ) -> Result<VacationBalance, CalendarError> {
        let usage = self.usage(account, applications, calendar)?;

        let consumable = if account.remaining_vacation_days_expire {
            usage.before_cutoff
        } else {
            usage.total
        };
        let from_remaining = account.remaining_vacation_days.min(consumable);
        let from_vacation = usage.total - from_remaining;

        let left_vacation_days = account.vacation_days - from_vacation;

        let expired = account.remaining_vacation_days_expire
            && !self.is_before_cutoff(account.year, today);
        let left_remaining_vacation_days = if expired {
            Decimal::ZERO
        } else {
            account.remaining_vacation_days - from_remaining
        };

        Ok(VacationBalance {
            year: account.year,
            vacation_days: account.vacation_days,
            remaining_vacation_days: account.remaining_vacation_days,
            used_days: usage.total,
            left_vacation_days,
            left_remaining_vacation_days,
            total_left_vacation_days: left_vacation_days + left_remaining_vacation_days,
            before_cutoff: self.cutoff.is_before(today),
        })
    }

    /// Would the accounts still cover everything once `candidate` is added as waiting?
    ///
    /// Only holidays draw on the balance; other vacation types always pass.
    pub fn check_application(
        &self,
        candidate: &LeaveApplication,
        accounts: &[Account],
        existing: &[LeaveApplication],
        calendar: &WorkCalendar,
        today: NaiveDate,
    ) -> Result<BalanceCheck, CalendarError> {
        let mut pending = candidate.clone();
        pending.status = ApplicationStatus::Waiting;
        if !pending.consumes_vacation_days() {
            return Ok(BalanceCheck::Sufficient);
        }

        let mut applications: Vec<LeaveApplication> = existing
            .iter()
            .filter(|application| application.id != pending.id)
            .cloned()
            .collect();
        applications.push(pending);

        for year in candidate.period.years() {
            let Some(account) = accounts
                .iter()
                .find(|account| account.year == year && account.person == candidate.person)
            else {
                return Ok(BalanceCheck::MissingAccount { year });
            };

            let balance = self.balance(account, &applications, calendar, today)?;
            if balance.left_vacation_days < Decimal::ZERO {
                // Report what was left before this request.
                let requested = candidate_days_in(candidate, year, calendar)?;
                return Ok(BalanceCheck::Insufficient {
                    year,
                    left_vacation_days: balance.left_vacation_days + requested,
                });
            }
        }

        Ok(BalanceCheck::Sufficient)
    }

    fn is_before_cutoff(&self, year: i32, today: NaiveDate) -> bool {
        match self.cutoff.date_in(year) {
            Some(cutoff) => today < cutoff,
            None => false,
        }
    }

    fn usage(
        &self,
        account: &Account,
        applications: &[LeaveApplication],
        calendar: &WorkCalendar,
    ) -> Result<Usage, CalendarError> {
        let mut usage = Usage {
            total: Decimal::ZERO,
            before_cutoff: Decimal::ZERO,
        };

        let Some(year_span) = DateRange::year(account.year) else {
            return Ok(usage);
        };
        let before_cutoff_span = self
            .cutoff
            .date_in(account.year)
            .and_then(|cutoff| DateRange::new(year_span.start, cutoff - Duration::days(1)));

        for application in applications
            .iter()
            .filter(|application| application.person == account.person)
            .filter(|application| application.consumes_vacation_days())
        {
            usage.total += days_within(application, &year_span, calendar)?;
            if let Some(span) = &before_cutoff_span {
                usage.before_cutoff += days_within(application, span, calendar)?;
            }
        }

        Ok(usage)
    }
}

fn candidate_days_in(
    candidate: &LeaveApplication,
    year: i32,
    calendar: &WorkCalendar,
) -> Result<Decimal, CalendarError> {
    match DateRange::year(year) {
        Some(span) => days_within(candidate, &span, calendar),
        None => Ok(Decimal::ZERO),
    }
}

/// Days of `application` inside `span`; the stored day count is used when it fits entirely.
pub(crate) fn days_within(
    application: &LeaveApplication,
    span: &DateRange,
    calendar: &WorkCalendar,
) -> Result<Decimal, CalendarError> {
    if span.covers(&application.period) {
        return Ok(application.days);
    }

    match application.period.intersection(span) {
        Some(part) => calendar.vacation_days(&part, application.day_length),
        None => Ok(Decimal::ZERO),
    }
}
