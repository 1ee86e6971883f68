use serde::{Deserialize, Serialize};

use super::domain::{DateRange, DayLength, LeaveApplication, PersonId};

/// How a requested period relates to the person's existing applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverlapCase {
    NoOverlapping,
    /// Every day of the request is already covered.
    FullyOverlapping,
    /// Some days are covered, some are not. Splitting off the free gaps is not supported.
    PartlyOverlapping,
}

impl OverlapCase {
    pub fn blocks_submission(self) -> bool {
        !matches!(self, OverlapCase::NoOverlapping)
    }

    pub const fn label(self) -> &'static str {
        match self {
            OverlapCase::NoOverlapping => "no overlap",
            OverlapCase::FullyOverlapping => "fully overlapping",
            OverlapCase::PartlyOverlapping => "partly overlapping",
        }
    }
}

fn complementary_halves(requested: DayLength, existing: DayLength) -> bool {
    requested.is_half_day() && existing.is_half_day() && requested != existing
}

/// Stateless classifier for a candidate period.
pub struct OverlapChecker;

impl OverlapChecker {
    /// Relevant applications of `person` that share at least one day with `candidate`.
    ///
    /// Relevant means not cancelled, or cancelled after having been allowed. A morning and a
    /// noon on the same day share the date but not the time, so they do not overlap.
    pub fn overlapping<'a>(
        person: &PersonId,
        candidate: &DateRange,
        day_length: DayLength,
        existing: &'a [LeaveApplication],
    ) -> Vec<&'a LeaveApplication> {
        existing
            .iter()
            .filter(|application| &application.person == person)
            .filter(|application| application.is_relevant())
            .filter(|application| application.period.overlaps(candidate))
            .filter(|application| !complementary_halves(day_length, application.day_length))
            .collect()
    }

    pub fn check(
        person: &PersonId,
        candidate: &DateRange,
        day_length: DayLength,
        existing: &[LeaveApplication],
    ) -> OverlapCase {
        let mut periods: Vec<DateRange> = Self::overlapping(person, candidate, day_length, existing)
            .into_iter()
            .filter_map(|application| application.period.intersection(candidate))
            .collect();

        if periods.is_empty() {
            return OverlapCase::NoOverlapping;
        }

        periods.sort_by_key(|period| period.start);

        // Walk the clipped periods in order; any gap before the next start leaves a free day.
        let mut next_uncovered = candidate.start;
        for period in periods {
            if period.start > next_uncovered {
                return OverlapCase::PartlyOverlapping;
            }
            if period.end >= next_uncovered {
                match period.end.succ_opt() {
                    Some(next) => next_uncovered = next,
                    None => return OverlapCase::FullyOverlapping,
                }
            }
        }

        if next_uncovered > candidate.end {
            OverlapCase::FullyOverlapping
        } else {
            OverlapCase::PartlyOverlapping
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::leave::domain::{
        ApplicationId, ApplicationStatus, DayLength, VacationType,
    };
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, month, day).expect("valid date")
    }

    fn range(start: NaiveDate, end: NaiveDate) -> DateRange {
        DateRange::new(start, end).expect("ordered range")
    }

    fn person() -> PersonId {
        PersonId("person-000001".to_string())
    }

    fn existing(id: &str, period: DateRange, status: ApplicationStatus) -> LeaveApplication {
        LeaveApplication {
            id: ApplicationId(id.to_string()),
            person: person(),
            applier: person(),
            period,
            day_length: DayLength::Full,
            vacation_type: VacationType::Holiday,
            reason: None,
            status,
            formerly_allowed: false,
            days: Decimal::ONE,
            application_date: date(1, 5),
            boss: None,
            canceller: None,
            edited_date: None,
            remind_date: None,
        }
    }

    #[test]
    fn disjoint_periods_do_not_overlap() {
        let applications = vec![existing(
            "a",
            range(date(6, 1), date(6, 5)),
            ApplicationStatus::Allowed,
        )];
        let case = OverlapChecker::check(
            &person(),
            &range(date(6, 8), date(6, 9)),
            DayLength::Full,
            &applications,
        );
        assert_eq!(case, OverlapCase::NoOverlapping);
        assert!(!case.blocks_submission());
    }

    #[test]
    fn request_inside_union_of_periods_is_fully_overlapping() {
        let applications = vec![
            existing("a", range(date(6, 1), date(6, 5)), ApplicationStatus::Allowed),
            existing("b", range(date(6, 6), date(6, 12)), ApplicationStatus::Waiting),
        ];
        let case = OverlapChecker::check(
            &person(),
            &range(date(6, 3), date(6, 10)),
            DayLength::Full,
            &applications,
        );
        assert_eq!(case, OverlapCase::FullyOverlapping);
    }

    #[test]
    fn gaps_make_the_request_partly_overlapping() {
        let applications = vec![
            existing("a", range(date(6, 1), date(6, 5)), ApplicationStatus::Allowed),
            existing("b", range(date(6, 8), date(6, 12)), ApplicationStatus::Waiting),
        ];
        let case = OverlapChecker::check(
            &person(),
            &range(date(6, 3), date(6, 10)),
            DayLength::Full,
            &applications,
        );
        assert_eq!(case, OverlapCase::PartlyOverlapping);

        let tail = OverlapChecker::check(
            &person(),
            &range(date(6, 10), date(6, 15)),
            DayLength::Full,
            &applications,
        );
        assert_eq!(tail, OverlapCase::PartlyOverlapping);
    }

    #[test]
    fn cancelled_applications_are_ignored_unless_formerly_allowed() {
        let mut withdrawn = existing(
            "a",
            range(date(6, 1), date(6, 5)),
            ApplicationStatus::Cancelled,
        );
        let candidate = range(date(6, 2), date(6, 3));
        assert_eq!(
            OverlapChecker::check(
                &person(),
                &candidate,
                DayLength::Full,
                std::slice::from_ref(&withdrawn)
            ),
            OverlapCase::NoOverlapping
        );

        withdrawn.formerly_allowed = true;
        assert_eq!(
            OverlapChecker::check(
                &person(),
                &candidate,
                DayLength::Full,
                std::slice::from_ref(&withdrawn)
            ),
            OverlapCase::FullyOverlapping
        );
    }

    #[test]
    fn other_persons_applications_do_not_count() {
        let mut colleague = existing("a", range(date(6, 1), date(6, 5)), ApplicationStatus::Allowed);
        colleague.person = PersonId("person-000002".to_string());
        let case = OverlapChecker::check(
            &person(),
            &range(date(6, 1), date(6, 5)),
            DayLength::Full,
            std::slice::from_ref(&colleague),
        );
        assert_eq!(case, OverlapCase::NoOverlapping);
    }

    #[test]
    fn morning_and_noon_of_the_same_day_do_not_clash() {
        let mut morning = existing("a", range(date(6, 3), date(6, 3)), ApplicationStatus::Allowed);
        morning.day_length = DayLength::Morning;
        let day = range(date(6, 3), date(6, 3));
        let applications = std::slice::from_ref(&morning);

        assert_eq!(
            OverlapChecker::check(&person(), &day, DayLength::Noon, applications),
            OverlapCase::NoOverlapping
        );
        assert_eq!(
            OverlapChecker::check(&person(), &day, DayLength::Morning, applications),
            OverlapCase::FullyOverlapping
        );
        assert_eq!(
            OverlapChecker::check(&person(), &day, DayLength::Full, applications),
            OverlapCase::FullyOverlapping
        );
    }
}
