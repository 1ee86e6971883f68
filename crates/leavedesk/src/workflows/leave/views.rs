use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::calculation::VacationBalance;
use super::domain::{ApplicationId, Comment, LeaveApplication, Person, PersonId};

/// Flattened application for listings and exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationStatusView {
    pub application_id: ApplicationId,
    pub person: PersonId,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub vacation_type: &'static str,
    pub status: &'static str,
    pub days: Decimal,
    pub formerly_allowed: bool,
}

impl LeaveApplication {
    pub fn status_view(&self) -> ApplicationStatusView {
        ApplicationStatusView {
            application_id: self.id.clone(),
            person: self.person.clone(),
            start: self.period.start,
            end: self.period.end,
            vacation_type: self.vacation_type.label(),
            status: self.status.label(),
            days: self.days,
            formerly_allowed: self.formerly_allowed,
        }
    }
}

/// An application together with its comment trail and the owner's balance for its year.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationDetail {
    pub application: LeaveApplication,
    pub comments: Vec<Comment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<VacationBalance>,
}

/// Per-person figures for the office overview of a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonStatistics {
    pub person: PersonId,
    pub login: String,
    pub name: String,
    pub waiting_days: Decimal,
    pub allowed_days: Decimal,
    /// Total left for the year the period starts in; `None` without an account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_vacation_days: Option<Decimal>,
}

impl PersonStatistics {
    pub(crate) fn empty(person: &Person) -> Self {
        Self {
            person: person.id.clone(),
            login: person.login.clone(),
            name: person.name.clone(),
            waiting_days: Decimal::ZERO,
            allowed_days: Decimal::ZERO,
            left_vacation_days: None,
        }
    }
}
