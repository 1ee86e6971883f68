use rust_decimal::Decimal;

use super::common::*;
use crate::workflows::leave::account::AccountSetup;
use crate::workflows::leave::repository::AccountRepository;
use crate::workflows::leave::validation::Rejection;
use crate::workflows::leave::LeaveServiceError;

fn setup(vacation_days: i64, remaining: i64) -> AccountSetup {
    AccountSetup {
        annual_vacation_days: Decimal::from(30),
        vacation_days: Decimal::from(vacation_days),
        remaining_vacation_days: Decimal::from(remaining),
        remaining_vacation_days_expire: true,
    }
}

#[test]
fn setup_account_is_an_office_task() {
    let (service, store, _notifier, _clock) = build_service();
    let office = actor(&store, &office_id());
    let user = actor(&store, &user_id());

    match service
        .ledger()
        .setup_account(&user, &user_id(), 2027, setup(30, 0))
    {
        Err(LeaveServiceError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }

    // joining mid-year: pro-rata entitlement of 15 days
    let account = service
        .ledger()
        .setup_account(&office, &user_id(), 2027, setup(15, 0))
        .expect("office sets up");
    assert_eq!(account.vacation_days, Decimal::from(15));
    assert_eq!(
        store
            .fetch_account(2027, &user_id())
            .expect("readable")
            .map(|account| account.annual_vacation_days),
        Some(Decimal::from(30))
    );
}

#[test]
fn negative_figures_are_rejected() {
    let (service, store, _notifier, _clock) = build_service();
    let office = actor(&store, &office_id());

    match service
        .ledger()
        .setup_account(&office, &user_id(), 2027, setup(-1, 0))
    {
        Err(LeaveServiceError::Rejected(Rejection::NegativeVacationDays)) => {}
        other => panic!("expected negative days rejection, got {other:?}"),
    }
}

#[test]
fn rollover_carries_over_what_is_left_on_new_years_eve() {
    let (service, store, _notifier, _clock) = build_service();
    let user = actor(&store, &user_id());
    let boss = actor(&store, &boss_id());
    let office = actor(&store, &office_id());

    let application = service
        .apply(&user, holiday_form(&user_id(), date(2026, 6, 1), date(2026, 6, 5)))
        .expect("accepted");
    service
        .allow(&boss, &application.id, None)
        .expect("allowed");

    let next = service
        .ledger()
        .rollover(&office, &user_id(), 2027)
        .expect("rolled over");
    assert_eq!(next.year, 2027);
    assert_eq!(next.vacation_days, Decimal::from(30));
    assert_eq!(next.remaining_vacation_days, Decimal::from(25));
    assert!(next.remaining_vacation_days_expire);

    // carry-over of 2026 itself had expired by 31 December
    service
        .ledger()
        .setup_account(&office, &user_id(), 2026, setup(30, 8))
        .expect("updated");
    let next = service
        .ledger()
        .rollover(&office, &user_id(), 2027)
        .expect("rolled over again");
    assert_eq!(next.remaining_vacation_days, Decimal::from(25));

    match service.ledger().rollover(&office, &user_id(), 2029) {
        Err(LeaveServiceError::Rejected(Rejection::MissingAccount { year })) => {
            assert_eq!(year, 2028)
        }
        other => panic!("expected missing account, got {other:?}"),
    }
}

#[test]
fn balance_is_none_without_account() {
    let (service, _store, _notifier, _clock) = build_service();
    assert!(service
        .ledger()
        .balance(&user_id(), 2030)
        .expect("readable")
        .is_none());
    assert!(service
        .ledger()
        .balance(&user_id(), 2026)
        .expect("readable")
        .is_some());
}

#[test]
fn rollover_into_the_first_representable_year_has_no_predecessor() {
    let (service, store, _notifier, _clock) = build_service();
    let office = actor(&store, &office_id());

    match service.ledger().rollover(&office, &user_id(), i32::MIN) {
        Err(LeaveServiceError::Rejected(Rejection::MissingAccount { year })) => {
            assert_eq!(year, i32::MIN)
        }
        other => panic!("expected missing account, got {other:?}"),
    }
}
