//! Applications for leave: submission, the boss/office decision flow and vacation balances.
//!
//! Storage, mail delivery, key generation and the current date are reached through traits
//! in [`repository`], [`keys`] and [`clock`]. [`memory::InMemoryLeaveStore`] implements the
//! storage traits over a serializable [`memory::LeaveLedger`].

pub mod account;
pub mod calculation;
pub mod calendar;
pub mod clock;
pub mod domain;
pub mod keys;
pub mod memory;
pub mod overlap;
pub mod permission;
pub mod person;
pub mod policy;
pub mod repository;
pub mod service;
pub mod validation;
pub mod views;

#[cfg(test)]
mod tests;

pub use account::{AccountLedger, AccountSetup};
pub use calculation::{BalanceCalculator, BalanceCheck, VacationBalance};
pub use calendar::{CalendarError, PublicHoliday, WorkCalendar, WorkingTime};
pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::{
    Account, ApplicationId, ApplicationStatus, Comment, CommentAction, DateRange, DayLength,
    InvalidTransition, LeaveApplication, MailNotification, Person, PersonId, Role, VacationType,
};
pub use keys::{Ed25519KeyGenerator, KeyGenerationError, KeyPair, KeyPairGenerator};
pub use memory::{InMemoryLeaveStore, LeaveLedger};
pub use overlap::{OverlapCase, OverlapChecker};
pub use permission::{authorize, Action, Actor, CommentRequirement, PermissionDenied};
pub use person::{NewPerson, PersonDirectory};
pub use policy::{CarryOverCutoff, LeavePolicy};
pub use repository::{
    AccountRepository, ApplicationRepository, CalendarRepository, CommentRepository, LeaveStore,
    Notification, NotificationError, NotificationTemplate, Notifier, PersonRepository,
    RepositoryError,
};
pub use service::{LeaveApplicationService, LeaveServiceError};
pub use validation::{ApplicationForm, LeaveValidator, Rejection};
pub use views::{ApplicationDetail, ApplicationStatusView, PersonStatistics};
