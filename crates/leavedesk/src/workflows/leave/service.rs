use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate};
use tracing::{debug, info, warn};

use super::account::AccountLedger;
use super::calculation::{days_within, BalanceCalculator, BalanceCheck, VacationBalance};
use super::calendar::{CalendarError, WorkCalendar};
use super::clock::Clock;
use super::domain::{
    ApplicationId, ApplicationStatus, Comment, CommentAction, DateRange, InvalidTransition,
    LeaveApplication, MailNotification, Person, PersonId, Role,
};
use super::overlap::OverlapChecker;
use super::permission::{authorize, Action, Actor, CommentRequirement, PermissionDenied};
use super::policy::LeavePolicy;
use super::repository::{LeaveStore, Notification, NotificationTemplate, Notifier, RepositoryError};
use super::validation::{ApplicationForm, LeaveValidator, Rejection};
use super::views::{ApplicationDetail, PersonStatistics};

/// Service driving applications for leave through their lifecycle.
///
/// Every operation runs validate, permission, overlap, balance, persist, comment and
/// notify in that order and stops at the first failure. Notification failures are logged
/// and never undo a persisted transition.
pub struct LeaveApplicationService<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
    policy: LeavePolicy,
    validator: LeaveValidator,
    calculator: BalanceCalculator,
    ledger: AccountLedger<S>,
}

impl<S, N> LeaveApplicationService<S, N>
where
    S: LeaveStore + 'static,
    N: Notifier + 'static,
{
    pub fn new(
        store: Arc<S>,
        notifier: Arc<N>,
        clock: Arc<dyn Clock>,
        policy: LeavePolicy,
    ) -> Self {
        let calculator = BalanceCalculator::new(policy.carry_over_cutoff);
        let ledger = AccountLedger::new(store.clone(), calculator, clock.clone());

        Self {
            validator: LeaveValidator::from_policy(&policy),
            store,
            notifier,
            clock,
            policy,
            calculator,
            ledger,
        }
    }

    pub fn ledger(&self) -> &AccountLedger<S> {
        &self.ledger
    }

    /// Submit a new application; it starts out waiting for a boss.
    pub fn apply(
        &self,
        actor: &Actor,
        form: ApplicationForm,
    ) -> Result<LeaveApplication, LeaveServiceError> {
        let period = self.validator.validate_form(&form)?;
        authorize(
            actor,
            Action::Apply {
                on_behalf_of: &form.person,
            },
        )?;
        let comment = self
            .validator
            .validate_comment(form.comment.as_deref(), CommentRequirement::Optional)?;

        let person = self.person(&form.person)?;
        if !person.is_active() {
            return Err(Rejection::InactivePerson(person.id).into());
        }

        let today = self.clock.today();
        let calendar = WorkCalendar::load(self.store.as_ref(), &person.id, period.years())?;
        let days = calendar.vacation_days(&period, form.day_length)?;
        if days.is_zero() {
            return Err(Rejection::ZeroDays.into());
        }

        let existing = self.store.for_person(&person.id)?;
        let overlap = OverlapChecker::check(&person.id, &period, form.day_length, &existing);
        if overlap.blocks_submission() {
            debug!(person = %person.id, %period, overlap = overlap.label(), "overlap found");
            return Err(Rejection::Overlapping(overlap).into());
        }

        let candidate = LeaveApplication {
            id: self.store.next_application_id()?,
            person: person.id.clone(),
            applier: actor.person.clone(),
            period,
            day_length: form.day_length,
            vacation_type: form.vacation_type,
            reason: form.reason.filter(|reason| !reason.trim().is_empty()),
            status: ApplicationStatus::Waiting,
            formerly_allowed: false,
            days,
            application_date: today,
            boss: None,
            canceller: None,
            edited_date: None,
            remind_date: None,
        };

        let mut accounts = Vec::new();
        for year in period.years() {
            if let Some(account) = self.store.fetch_account(year, &person.id)? {
                accounts.push(account);
            }
        }
        match self
            .calculator
            .check_application(&candidate, &accounts, &existing, &calendar, today)?
        {
            BalanceCheck::Sufficient => {}
            BalanceCheck::MissingAccount { year } => {
                return Err(Rejection::MissingAccount { year }.into())
            }
            BalanceCheck::Insufficient {
                year,
                left_vacation_days,
            } => {
                return Err(Rejection::InsufficientVacationDays {
                    year,
                    left_vacation_days,
                }
                .into())
            }
        }

        let stored = self.store.insert(candidate)?;
        self.record_comment(&stored, actor, CommentAction::Applied, comment, today)?;

        info!(
            application = %stored.id,
            person = %stored.person,
            applier = %stored.applier,
            period = %stored.period,
            days = %stored.days,
            vacation_type = stored.vacation_type.label(),
            "application submitted"
        );

        let mut confirmation = vec![stored.person.clone()];
        if stored.applier != stored.person {
            confirmation.push(stored.applier.clone());
        }
        self.notify(
            Notification::new(NotificationTemplate::Applied, confirmation)
                .for_application(&stored.id)
                .detail("applier", stored.applier.0.clone()),
        );
        let bosses = self.subscribers(Role::Boss, MailNotification::Boss)?;
        self.notify_signed(
            &bosses,
            Notification::new(NotificationTemplate::NewApplication, Vec::new())
                .for_application(&stored.id)
                .detail("person", stored.person.0.clone()),
        );

        Ok(stored)
    }

    /// WAITING to ALLOWED; bosses only, comment optional.
    pub fn allow(
        &self,
        actor: &Actor,
        id: &ApplicationId,
        comment: Option<&str>,
    ) -> Result<LeaveApplication, LeaveServiceError> {
        let requirement = authorize(actor, Action::Allow)?;
        let comment = self.validator.validate_comment(comment, requirement)?;

        let mut application = self.application(id)?;
        application.transition_to(ApplicationStatus::Allowed)?;
        let today = self.clock.today();
        application.boss = Some(actor.person.clone());
        application.edited_date = Some(today);

        self.store.update(application.clone())?;
        self.record_comment(&application, actor, CommentAction::Allowed, comment, today)?;
        info!(application = %application.id, boss = %actor.person, "application allowed");

        let mut recipients = vec![application.person.clone()];
        recipients.extend(self.management(Role::Office, MailNotification::Office)?);
        self.notify(
            Notification::new(NotificationTemplate::Allowed, dedup(recipients))
                .for_application(&application.id)
                .detail("boss", actor.person.0.clone()),
        );

        Ok(application)
    }

    /// WAITING to REJECTED; bosses only, a comment is mandatory.
    pub fn reject(
        &self,
        actor: &Actor,
        id: &ApplicationId,
        comment: Option<&str>,
    ) -> Result<LeaveApplication, LeaveServiceError> {
        let requirement = authorize(actor, Action::Reject)?;
        let comment = self.validator.validate_comment(comment, requirement)?;

        let mut application = self.application(id)?;
        application.transition_to(ApplicationStatus::Rejected)?;
        let today = self.clock.today();
        application.boss = Some(actor.person.clone());
        application.edited_date = Some(today);

        self.store.update(application.clone())?;
        self.record_comment(&application, actor, CommentAction::Rejected, comment, today)?;
        info!(application = %application.id, boss = %actor.person, "application rejected");

        self.notify(
            Notification::new(
                NotificationTemplate::Rejected,
                vec![application.person.clone()],
            )
            .for_application(&application.id)
            .detail("boss", actor.person.0.clone()),
        );

        Ok(application)
    }

    /// Owners withdraw their own waiting applications; the office cancels waiting or
    /// allowed applications of anyone, with a comment.
    pub fn cancel(
        &self,
        actor: &Actor,
        id: &ApplicationId,
        comment: Option<&str>,
    ) -> Result<LeaveApplication, LeaveServiceError> {
        let mut application = self.application(id)?;
        let requirement = authorize(
            actor,
            Action::Cancel {
                application: &application,
            },
        )?;
        let comment = self.validator.validate_comment(comment, requirement)?;

        let previous = application.transition_to(ApplicationStatus::Cancelled)?;
        let today = self.clock.today();
        application.canceller = Some(actor.person.clone());
        application.edited_date = Some(today);

        self.store.update(application.clone())?;
        self.record_comment(&application, actor, CommentAction::Cancelled, comment, today)?;
        info!(
            application = %application.id,
            canceller = %actor.person,
            previous = previous.label(),
            formerly_allowed = application.formerly_allowed,
            "application cancelled"
        );

        let mut recipients = Vec::new();
        if !actor.is(&application.person) {
            recipients.push(application.person.clone());
        }
        if application.formerly_allowed {
            recipients.extend(self.management(Role::Office, MailNotification::Office)?);
        }
        if !recipients.is_empty() {
            self.notify(
                Notification::new(NotificationTemplate::Cancelled, dedup(recipients))
                    .for_application(&application.id)
                    .detail("canceller", actor.person.0.clone()),
            );
        }

        Ok(application)
    }

    /// Hands a waiting application to another boss for the decision.
    pub fn refer(
        &self,
        actor: &Actor,
        id: &ApplicationId,
        recipient_login: &str,
    ) -> Result<(), LeaveServiceError> {
        authorize(actor, Action::Refer)?;

        let application = self.application(id)?;
        if !application.has_status(ApplicationStatus::Waiting) {
            return Err(Rejection::NotWaiting(application.status).into());
        }

        let recipient = self
            .store
            .fetch_person_by_login(recipient_login)?
            .filter(|person| person.is_active() && person.has_role(Role::Boss))
            .ok_or_else(|| Rejection::ReferRecipientNotBoss(recipient_login.to_string()))?;

        info!(
            application = %application.id,
            referred_by = %actor.person,
            recipient = %recipient.id,
            "application referred"
        );
        self.notify_signed(
            std::slice::from_ref(&recipient),
            Notification::new(NotificationTemplate::Refer, Vec::new())
                .for_application(&application.id)
                .detail("referred_by", actor.person.0.clone()),
        );

        Ok(())
    }

    /// Nudges the bosses about a waiting application, at most once a day.
    pub fn remind(
        &self,
        actor: &Actor,
        id: &ApplicationId,
    ) -> Result<LeaveApplication, LeaveServiceError> {
        let mut application = self.application(id)?;
        authorize(
            actor,
            Action::Remind {
                application: &application,
            },
        )?;
        if !application.has_status(ApplicationStatus::Waiting) {
            return Err(Rejection::NotWaiting(application.status).into());
        }

        let today = self.clock.today();
        let earliest = application
            .application_date
            .checked_add_signed(Duration::days(i64::from(self.policy.remind_after_days)))
            .ok_or(Rejection::RemindOutOfRange {
                remind_after_days: self.policy.remind_after_days,
            })?;
        if today < earliest {
            return Err(Rejection::RemindTooEarly { earliest }.into());
        }
        if application.remind_date == Some(today) {
            return Err(Rejection::RemindAlreadySent.into());
        }

        application.remind_date = Some(today);
        self.store.update(application.clone())?;
        info!(application = %application.id, "bosses reminded");

        let bosses = self.management(Role::Boss, MailNotification::Boss)?;
        self.notify(
            Notification::new(NotificationTemplate::Remind, bosses)
                .for_application(&application.id),
        );

        Ok(application)
    }

    pub fn detail(
        &self,
        actor: &Actor,
        id: &ApplicationId,
    ) -> Result<ApplicationDetail, LeaveServiceError> {
        let application = self.application(id)?;
        authorize(
            actor,
            Action::View {
                owner: &application.person,
            },
        )?;

        let comments = self.store.for_application(&application.id)?;
        let balance = self
            .ledger
            .balance(&application.person, application.period.start.year())?;

        Ok(ApplicationDetail {
            application,
            comments,
            balance,
        })
    }

    /// Applications touching `year`. Without a status filter cancelled applications only
    /// show up when they had been allowed; filtering by CANCELLED lists exactly those.
    pub fn list(
        &self,
        actor: &Actor,
        year: i32,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<LeaveApplication>, LeaveServiceError> {
        authorize(actor, Action::ListApplications)?;

        let Some(span) = DateRange::year(year) else {
            return Ok(Vec::new());
        };
        let mut applications: Vec<LeaveApplication> = self
            .store
            .in_period(&span)?
            .into_iter()
            .filter(|application| match status {
                None => application.is_relevant(),
                Some(ApplicationStatus::Cancelled) => {
                    application.has_status(ApplicationStatus::Cancelled)
                        && application.formerly_allowed
                }
                Some(status) => application.has_status(status),
            })
            .collect();
        applications.sort_by(|a, b| {
            (a.period.start, &a.person, &a.id).cmp(&(b.period.start, &b.person, &b.id))
        });

        Ok(applications)
    }

    /// Left days of (person, year) as of today.
    pub fn account_summary(
        &self,
        actor: &Actor,
        person: &PersonId,
        year: i32,
    ) -> Result<VacationBalance, LeaveServiceError> {
        authorize(actor, Action::ViewAccount { owner: person })?;
        let balance = self
            .ledger
            .balance(person, year)?
            .ok_or(Rejection::MissingAccount { year })?;
        Ok(balance)
    }

    /// Waiting and allowed days within `from..=to` for every active person.
    pub fn statistics(
        &self,
        actor: &Actor,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PersonStatistics>, LeaveServiceError> {
        authorize(actor, Action::ViewStatistics)?;
        let period = DateRange::new(from, to).ok_or(Rejection::InvalidPeriod {
            start: from,
            end: to,
        })?;

        let mut persons: Vec<Person> = self
            .store
            .all_persons()?
            .into_iter()
            .filter(Person::is_active)
            .collect();
        persons.sort_by(|a, b| a.login.cmp(&b.login));

        let mut statistics = Vec::with_capacity(persons.len());
        for person in &persons {
            let calendar = WorkCalendar::load(self.store.as_ref(), &person.id, period.years())?;
            let mut row = PersonStatistics::empty(person);

            for application in self.store.for_person(&person.id)? {
                let bucket = match application.status {
                    ApplicationStatus::Waiting => &mut row.waiting_days,
                    ApplicationStatus::Allowed => &mut row.allowed_days,
                    ApplicationStatus::Rejected | ApplicationStatus::Cancelled => continue,
                };
                *bucket += days_within(&application, &period, &calendar)?;
            }

            row.left_vacation_days = self
                .ledger
                .balance(&person.id, from.year())?
                .map(|balance| balance.total_left_vacation_days);
            statistics.push(row);
        }

        Ok(statistics)
    }

    fn person(&self, id: &PersonId) -> Result<Person, LeaveServiceError> {
        let person = self
            .store
            .fetch_person(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(person)
    }

    fn application(&self, id: &ApplicationId) -> Result<LeaveApplication, LeaveServiceError> {
        let application = self.store.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        Ok(application)
    }

    fn record_comment(
        &self,
        application: &LeaveApplication,
        actor: &Actor,
        action: CommentAction,
        text: Option<String>,
        date: NaiveDate,
    ) -> Result<(), RepositoryError> {
        self.store.append(Comment {
            application: application.id.clone(),
            author: actor.person.clone(),
            action,
            text,
            date,
        })
    }

    /// Active persons holding `role` who subscribed to `notification`.
    fn subscribers(
        &self,
        role: Role,
        notification: MailNotification,
    ) -> Result<Vec<Person>, RepositoryError> {
        Ok(self
            .store
            .all_persons()?
            .into_iter()
            .filter(|person| {
                person.is_active() && person.has_role(role) && person.has_notification(notification)
            })
            .collect())
    }

    fn management(
        &self,
        role: Role,
        notification: MailNotification,
    ) -> Result<Vec<PersonId>, RepositoryError> {
        Ok(self
            .subscribers(role, notification)?
            .into_iter()
            .map(|person| person.id)
            .collect())
    }

    fn notify(&self, notification: Notification) {
        if notification.recipients.is_empty() {
            debug!(
                template = notification.template.label(),
                "no recipients for notification"
            );
            return;
        }

        let template = notification.template.label();
        if let Err(err) = self.notifier.send(notification) {
            warn!(error = %err, template, "notification not delivered");
        }
    }

    /// Sends `notification` to each recipient on their own, with a `token` detail signed by
    /// the recipient's key so the decision link can be checked against it.
    fn notify_signed(&self, recipients: &[Person], notification: Notification) {
        for recipient in recipients {
            let mut personal = notification.clone();
            personal.recipients = vec![recipient.id.clone()];

            let token = recipient
                .keys
                .as_ref()
                .zip(notification.application_id.as_ref())
                .and_then(|(keys, application)| keys.sign_token(application));
            match token {
                Some(token) => personal = personal.detail("token", token),
                None => debug!(
                    recipient = %recipient.id,
                    template = notification.template.label(),
                    "no usable key pair, notification sent without token"
                ),
            }
            self.notify(personal);
        }
    }
}

fn dedup(mut recipients: Vec<PersonId>) -> Vec<PersonId> {
    let mut seen = std::collections::BTreeSet::new();
    recipients.retain(|person| seen.insert(person.clone()));
    recipients
}

/// Error raised by the leave workflow.
#[derive(Debug, thiserror::Error)]
pub enum LeaveServiceError {
    #[error("request rejected: {0}")]
    Rejected(#[from] Rejection),
    #[error(transparent)]
    Forbidden(#[from] PermissionDenied),
    #[error(transparent)]
    Calendar(#[from] CalendarError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<InvalidTransition> for LeaveServiceError {
    fn from(value: InvalidTransition) -> Self {
        Self::Rejected(Rejection::InvalidTransition(value))
    }
}

impl LeaveServiceError {
    /// The rejection reason, when the request was turned down on its merits.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            LeaveServiceError::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }
}
