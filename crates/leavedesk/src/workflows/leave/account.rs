use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use super::calculation::{BalanceCalculator, VacationBalance};
use super::calendar::WorkCalendar;
use super::clock::Clock;
use super::domain::{Account, PersonId};
use super::permission::{authorize, Action, Actor};
use super::repository::{
    AccountRepository, ApplicationRepository, CalendarRepository, PersonRepository,
    RepositoryError,
};
use super::service::LeaveServiceError;
use super::validation::Rejection;

/// Entitlement figures for creating or updating a holidays account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSetup {
    pub annual_vacation_days: Decimal,
    pub vacation_days: Decimal,
    pub remaining_vacation_days: Decimal,
    pub remaining_vacation_days_expire: bool,
}

/// Yearly holidays accounts and their balances.
pub struct AccountLedger<S> {
    store: Arc<S>,
    calculator: BalanceCalculator,
    clock: Arc<dyn Clock>,
}

impl<S> AccountLedger<S>
where
    S: PersonRepository + AccountRepository + ApplicationRepository + CalendarRepository + 'static,
{
    pub fn new(store: Arc<S>, calculator: BalanceCalculator, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            calculator,
            clock,
        }
    }

    /// Creates the account for (person, year) or overwrites its figures.
    pub fn setup_account(
        &self,
        actor: &Actor,
        person: &PersonId,
        year: i32,
        setup: AccountSetup,
    ) -> Result<Account, LeaveServiceError> {
        authorize(actor, Action::ManageAccounts)?;

        if [
            setup.annual_vacation_days,
            setup.vacation_days,
            setup.remaining_vacation_days,
        ]
        .iter()
        .any(|days| days.is_sign_negative())
        {
            return Err(Rejection::NegativeVacationDays.into());
        }

        self.store
            .fetch_person(person)?
            .ok_or(RepositoryError::NotFound)?;

        let account = Account {
            person: person.clone(),
            year,
            annual_vacation_days: setup.annual_vacation_days,
            vacation_days: setup.vacation_days,
            remaining_vacation_days: setup.remaining_vacation_days,
            remaining_vacation_days_expire: setup.remaining_vacation_days_expire,
        };
        self.store.save_account(account.clone())?;

        info!(
            person = %person,
            year,
            vacation_days = %account.vacation_days,
            remaining_vacation_days = %account.remaining_vacation_days,
            "holidays account saved"
        );
        Ok(account)
    }

    /// Opens `new_year` with last year's annual entitlement; the carry-over is whatever was
    /// left of the previous year on 31 December.
    pub fn rollover(
        &self,
        actor: &Actor,
        person: &PersonId,
        new_year: i32,
    ) -> Result<Account, LeaveServiceError> {
        authorize(actor, Action::ManageAccounts)?;

        let previous_year = new_year
            .checked_sub(1)
            .ok_or(Rejection::MissingAccount { year: new_year })?;
        let previous = self
            .store
            .fetch_account(previous_year, person)?
            .ok_or(Rejection::MissingAccount {
                year: previous_year,
            })?;

        let last_day = NaiveDate::from_ymd_opt(previous_year, 12, 31)
            .ok_or(Rejection::MissingAccount { year: new_year })?;
        let balance = self.compute(&previous, last_day)?;
        let carry_over = balance.total_left_vacation_days.max(Decimal::ZERO);

        let account = match self.store.fetch_account(new_year, person)? {
            Some(mut existing) => {
                existing.remaining_vacation_days = carry_over;
                existing
            }
            None => Account {
                person: person.clone(),
                year: new_year,
                annual_vacation_days: previous.annual_vacation_days,
                vacation_days: previous.annual_vacation_days,
                remaining_vacation_days: carry_over,
                remaining_vacation_days_expire: previous.remaining_vacation_days_expire,
            },
        };
        self.store.save_account(account.clone())?;

        info!(
            person = %person,
            year = new_year,
            carry_over = %carry_over,
            "holidays account rolled over"
        );
        Ok(account)
    }

    /// Balance of (person, year) as of today, or `None` without an account.
    pub fn balance(
        &self,
        person: &PersonId,
        year: i32,
    ) -> Result<Option<VacationBalance>, LeaveServiceError> {
        self.balance_on(person, year, self.clock.today())
    }

    pub fn balance_on(
        &self,
        person: &PersonId,
        year: i32,
        today: NaiveDate,
    ) -> Result<Option<VacationBalance>, LeaveServiceError> {
        match self.store.fetch_account(year, person)? {
            Some(account) => Ok(Some(self.compute(&account, today)?)),
            None => Ok(None),
        }
    }

    fn compute(
        &self,
        account: &Account,
        today: NaiveDate,
    ) -> Result<VacationBalance, LeaveServiceError> {
        let applications = self.store.for_person(&account.person)?;
        let calendar =
            WorkCalendar::load(self.store.as_ref(), &account.person, account.year..=account.year)?;
        let balance = self
            .calculator
            .balance(account, &applications, &calendar, today)?;
        Ok(balance)
    }
}
