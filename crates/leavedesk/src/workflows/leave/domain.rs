use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::keys::KeyPair;

/// Identifier wrapper for persons known to the leave ledger.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PersonId(pub String);

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for submitted applications for leave.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Permission tags granted to a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Boss,
    Office,
    Admin,
    Inactive,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Boss => "BOSS",
            Role::Office => "OFFICE",
            Role::Admin => "ADMIN",
            Role::Inactive => "INACTIVE",
        }
    }
}

/// Which management notifications a person wants to receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MailNotification {
    None,
    Boss,
    Office,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub login: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub roles: BTreeSet<Role>,
    #[serde(default)]
    pub notifications: BTreeSet<MailNotification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<KeyPair>,
}

impl Person {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_active(&self) -> bool {
        !self.has_role(Role::Inactive)
    }

    pub fn has_notification(&self, notification: MailNotification) -> bool {
        self.notifications.contains(&notification)
    }
}

/// Yearly vacation-day ledger for one person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub person: PersonId,
    pub year: i32,
    pub annual_vacation_days: Decimal,
    /// Entitlement for this year; differs from the annual figure for pro-rata years.
    pub vacation_days: Decimal,
    /// Days carried over from the previous year.
    pub remaining_vacation_days: Decimal,
    pub remaining_vacation_days_expire: bool,
}

/// Inclusive calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// The whole calendar year, or `None` outside chrono's supported range.
    pub fn year(year: i32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1)?;
        let end = NaiveDate::from_ymd_opt(year, 12, 31)?;
        Some(Self { start, end })
    }

    pub fn is_single_day(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn covers(&self, other: &DateRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn intersection(&self, other: &DateRange) -> Option<DateRange> {
        DateRange::new(self.start.max(other.start), self.end.min(other.end))
    }

    pub fn years(&self) -> std::ops::RangeInclusive<i32> {
        self.start.year()..=self.end.year()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |date| *date <= end)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Portion of a day: used for working times, public holidays and half-day requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayLength {
    Full,
    Morning,
    Noon,
    Zero,
}

impl DayLength {
    pub fn fraction(self) -> Decimal {
        match self {
            DayLength::Full => Decimal::ONE,
            DayLength::Morning | DayLength::Noon => Decimal::new(5, 1),
            DayLength::Zero => Decimal::ZERO,
        }
    }

    pub fn is_half_day(self) -> bool {
        matches!(self, DayLength::Morning | DayLength::Noon)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VacationType {
    Holiday,
    SpecialLeave,
    UnpaidLeave,
    Overtime,
}

impl VacationType {
    pub const fn label(self) -> &'static str {
        match self {
            VacationType::Holiday => "holiday",
            VacationType::SpecialLeave => "special_leave",
            VacationType::UnpaidLeave => "unpaid_leave",
            VacationType::Overtime => "overtime",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Waiting,
    Allowed,
    Rejected,
    Cancelled,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Waiting => "waiting",
            ApplicationStatus::Allowed => "allowed",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Cancelled => "cancelled",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, ApplicationStatus::Rejected | ApplicationStatus::Cancelled)
    }

    pub const fn can_transition_to(self, next: ApplicationStatus) -> bool {
        matches!(
            (self, next),
            (ApplicationStatus::Waiting, ApplicationStatus::Allowed)
                | (ApplicationStatus::Waiting, ApplicationStatus::Rejected)
                | (ApplicationStatus::Waiting, ApplicationStatus::Cancelled)
                | (ApplicationStatus::Allowed, ApplicationStatus::Cancelled)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("application cannot move from {} to {}", .from.label(), .to.label())]
pub struct InvalidTransition {
    pub from: ApplicationStatus,
    pub to: ApplicationStatus,
}

/// A single leave request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveApplication {
    pub id: ApplicationId,
    pub person: PersonId,
    /// Who submitted the request; the office may apply on behalf of others.
    pub applier: PersonId,
    pub period: DateRange,
    pub day_length: DayLength,
    pub vacation_type: VacationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub formerly_allowed: bool,
    pub days: Decimal,
    pub application_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boss: Option<PersonId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canceller: Option<PersonId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remind_date: Option<NaiveDate>,
}

impl LeaveApplication {
    pub fn has_status(&self, status: ApplicationStatus) -> bool {
        self.status == status
    }

    /// Non-cancelled, or cancelled after having been allowed.
    pub fn is_relevant(&self) -> bool {
        !self.has_status(ApplicationStatus::Cancelled) || self.formerly_allowed
    }

    /// Waiting or allowed holidays draw on the vacation balance.
    pub fn consumes_vacation_days(&self) -> bool {
        self.vacation_type == VacationType::Holiday
            && matches!(
                self.status,
                ApplicationStatus::Waiting | ApplicationStatus::Allowed
            )
    }

    /// Move along the status graph, returning the previous status.
    pub fn transition_to(
        &mut self,
        next: ApplicationStatus,
    ) -> Result<ApplicationStatus, InvalidTransition> {
        let previous = self.status;
        if !previous.can_transition_to(next) {
            return Err(InvalidTransition {
                from: previous,
                to: next,
            });
        }

        if previous == ApplicationStatus::Allowed && next == ApplicationStatus::Cancelled {
            self.formerly_allowed = true;
        }
        self.status = next;
        Ok(previous)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommentAction {
    Applied,
    Allowed,
    Rejected,
    Cancelled,
}

/// Note recorded with a status transition. Never edited after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub application: ApplicationId,
    pub author: PersonId,
    pub action: CommentAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub date: NaiveDate,
}
