use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::domain::{
    ApplicationStatus, DateRange, DayLength, InvalidTransition, PersonId, VacationType,
};
use super::overlap::OverlapCase;
use super::permission::CommentRequirement;
use super::policy::LeavePolicy;

/// Inbound request to apply for leave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationForm {
    /// The person taking the leave; may differ from the acting person for the office.
    pub person: PersonId,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default = "full_day")]
    pub day_length: DayLength,
    pub vacation_type: VacationType,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

fn full_day() -> DayLength {
    DayLength::Full
}

/// Reasons a request is turned down without anything being persisted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("period must not end before it starts ({start} > {end})")]
    InvalidPeriod { start: NaiveDate, end: NaiveDate },
    #[error("half days can only be requested for a single day")]
    HalfDayOverSeveralDays,
    #[error("day length ZERO cannot be requested")]
    ZeroDayLength,
    #[error("reason exceeds {max} characters")]
    ReasonTooLong { max: usize },
    #[error("a comment is mandatory for this action")]
    CommentRequired,
    #[error("comment exceeds {max} characters")]
    CommentTooLong { max: usize },
    #[error("the requested period contains no working days")]
    ZeroDays,
    #[error("the requested period is {} with existing applications", .0.label())]
    Overlapping(OverlapCase),
    #[error("not enough vacation days left in {year} ({left_vacation_days} left)")]
    InsufficientVacationDays {
        year: i32,
        left_vacation_days: Decimal,
    },
    #[error("no holidays account for {year}")]
    MissingAccount { year: i32 },
    #[error("vacation days must not be negative")]
    NegativeVacationDays,
    #[error("person {0} is inactive")]
    InactivePerson(PersonId),
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    #[error("application is {}, expected waiting", .0.label())]
    NotWaiting(ApplicationStatus),
    #[error("reminder already sent today")]
    RemindAlreadySent,
    #[error("bosses can be reminded from {earliest} on")]
    RemindTooEarly { earliest: NaiveDate },
    #[error("a reminder delay of {remind_after_days} days never falls due")]
    RemindOutOfRange { remind_after_days: u32 },
    #[error("{0} cannot be asked to decide, only bosses can")]
    ReferRecipientNotBoss(String),
    #[error("login {0} is already taken")]
    LoginTaken(String),
}

/// Form and comment checks run before any state is touched.
#[derive(Debug, Clone)]
pub struct LeaveValidator {
    comment_max_length: usize,
    reason_max_length: usize,
}

impl LeaveValidator {
    pub fn from_policy(policy: &LeavePolicy) -> Self {
        Self {
            comment_max_length: policy.comment_max_length,
            reason_max_length: policy.reason_max_length,
        }
    }

    pub fn validate_form(&self, form: &ApplicationForm) -> Result<DateRange, Rejection> {
        let period = DateRange::new(form.start, form.end).ok_or(Rejection::InvalidPeriod {
            start: form.start,
            end: form.end,
        })?;

        if form.day_length == DayLength::Zero {
            return Err(Rejection::ZeroDayLength);
        }
        if form.day_length.is_half_day() && !period.is_single_day() {
            return Err(Rejection::HalfDayOverSeveralDays);
        }

        if let Some(reason) = &form.reason {
            if reason.chars().count() > self.reason_max_length {
                return Err(Rejection::ReasonTooLong {
                    max: self.reason_max_length,
                });
            }
        }

        Ok(period)
    }

    /// Trims the comment; blank comments count as missing.
    pub fn validate_comment(
        &self,
        text: Option<&str>,
        requirement: CommentRequirement,
    ) -> Result<Option<String>, Rejection> {
        let text = text.map(str::trim).filter(|text| !text.is_empty());

        match (text, requirement) {
            (None, CommentRequirement::Mandatory) => Err(Rejection::CommentRequired),
            (None, CommentRequirement::Optional) => Ok(None),
            (Some(text), _) if text.chars().count() > self.comment_max_length => {
                Err(Rejection::CommentTooLong {
                    max: self.comment_max_length,
                })
            }
            (Some(text), _) => Ok(Some(text.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, month, day).expect("valid date")
    }

    fn validator() -> LeaveValidator {
        LeaveValidator::from_policy(&LeavePolicy::default())
    }

    fn form(start: NaiveDate, end: NaiveDate, day_length: DayLength) -> ApplicationForm {
        ApplicationForm {
            person: PersonId("person-000001".to_string()),
            start,
            end,
            day_length,
            vacation_type: VacationType::Holiday,
            reason: None,
            comment: None,
        }
    }

    #[test]
    fn inverted_period_is_rejected() {
        match validator().validate_form(&form(date(6, 5), date(6, 1), DayLength::Full)) {
            Err(Rejection::InvalidPeriod { start, end }) => {
                assert_eq!(start, date(6, 5));
                assert_eq!(end, date(6, 1));
            }
            other => panic!("expected invalid period, got {other:?}"),
        }
    }

    #[test]
    fn half_day_must_be_a_single_day() {
        assert_eq!(
            validator().validate_form(&form(date(6, 1), date(6, 2), DayLength::Morning)),
            Err(Rejection::HalfDayOverSeveralDays)
        );
        assert!(validator()
            .validate_form(&form(date(6, 1), date(6, 1), DayLength::Noon))
            .is_ok());
    }

    #[test]
    fn overly_long_reason_is_rejected() {
        let mut long = form(date(6, 1), date(6, 2), DayLength::Full);
        long.reason = Some("x".repeat(201));
        assert_eq!(
            validator().validate_form(&long),
            Err(Rejection::ReasonTooLong { max: 200 })
        );
    }

    #[test]
    fn mandatory_comment_must_not_be_blank() {
        let validator = validator();
        assert_eq!(
            validator.validate_comment(Some("   "), CommentRequirement::Mandatory),
            Err(Rejection::CommentRequired)
        );
        assert_eq!(
            validator.validate_comment(None, CommentRequirement::Mandatory),
            Err(Rejection::CommentRequired)
        );
        assert_eq!(
            validator.validate_comment(None, CommentRequirement::Optional),
            Ok(None)
        );
        assert_eq!(
            validator.validate_comment(Some(" enjoy "), CommentRequirement::Mandatory),
            Ok(Some("enjoy".to_string()))
        );
    }

    #[test]
    fn comment_length_is_capped() {
        let text = "y".repeat(201);
        assert_eq!(
            validator().validate_comment(Some(&text), CommentRequirement::Optional),
            Err(Rejection::CommentTooLong { max: 200 })
        );
    }
}
