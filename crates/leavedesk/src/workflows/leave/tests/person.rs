use std::sync::Arc;

use super::common::*;
use crate::workflows::leave::domain::{MailNotification, PersonId, Role};
use crate::workflows::leave::person::{NewPerson, PersonDirectory};
use crate::workflows::leave::repository::{NotificationTemplate, PersonRepository};
use crate::workflows::leave::validation::Rejection;
use crate::workflows::leave::LeaveServiceError;

fn identity(login: &str) -> NewPerson {
    NewPerson {
        login: login.to_string(),
        name: format!("{login} example"),
        email: Some(format!("{login}@example.org")),
    }
}

fn directory(
    store: Arc<MemoryStore>,
) -> (PersonDirectory<MemoryStore, MemoryNotifier>, Arc<MemoryNotifier>) {
    let notifier = Arc::new(MemoryNotifier::default());
    let directory = PersonDirectory::new(store, notifier.clone(), Arc::new(StaticKeys));
    (directory, notifier)
}

#[test]
fn first_sign_in_creates_an_office_user_and_later_ones_plain_users() {
    let store = Arc::new(MemoryStore::default());
    let (directory, _notifier) = directory(store.clone());

    let first = directory.sign_in(identity("amelie")).expect("first sign-in");
    assert_eq!(first.roles, roles(&[Role::User, Role::Office]));
    assert!(first.keys.is_some());

    let second = directory.sign_in(identity("bruno")).expect("second sign-in");
    assert_eq!(second.roles, roles(&[Role::User]));
    assert_ne!(first.id, second.id);

    let again = directory.sign_in(identity("amelie")).expect("known login");
    assert_eq!(again.id, first.id);
    assert_eq!(store.all_persons().expect("readable").len(), 2);
}

#[test]
fn key_generation_failure_still_creates_the_person() {
    let store = Arc::new(MemoryStore::default());
    let notifier = Arc::new(MemoryNotifier::default());
    let directory = PersonDirectory::new(store.clone(), notifier.clone(), Arc::new(FailingKeys));

    let person = directory.sign_in(identity("amelie")).expect("created anyway");
    assert!(person.keys.is_none());
    assert!(store
        .fetch_person(&person.id)
        .expect("readable")
        .is_some());

    let alerts = notifier.with_template(NotificationTemplate::KeyGenerationError);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].recipients, vec![person.id.clone()]);
    assert_eq!(alerts[0].details.get("login").map(String::as_str), Some("amelie"));
}

#[test]
fn deactivated_persons_cannot_sign_in_and_leave_active_lookups() {
    let store = seeded_store();
    let (directory, _notifier) = directory(store.clone());
    let office = actor(&store, &office_id());

    let deactivated = directory
        .deactivate(&office, &user_id())
        .expect("office deactivates");
    assert_eq!(deactivated.roles, roles(&[Role::Inactive]));

    match directory.sign_in(identity("ursula")) {
        Err(LeaveServiceError::Rejected(Rejection::InactivePerson(id))) => {
            assert_eq!(id, user_id())
        }
        other => panic!("expected inactive person, got {other:?}"),
    }

    let inactive = directory.inactive().expect("lookup");
    assert_eq!(inactive.len(), 1);
    assert!(directory
        .active()
        .expect("lookup")
        .iter()
        .all(|person| person.id != user_id()));
}

#[test]
fn lookups_by_role_and_notification() {
    let store = seeded_store();
    let (directory, _notifier) = directory(store);

    let bosses: Vec<PersonId> = directory
        .with_role(Role::Boss)
        .expect("lookup")
        .into_iter()
        .map(|person| person.id)
        .collect();
    assert_eq!(bosses, vec![boss_id(), PersonId("bianca".to_string())]);

    let subscribed = directory
        .with_notification(MailNotification::Office)
        .expect("lookup");
    assert_eq!(subscribed.len(), 1);
    assert_eq!(subscribed[0].id, office_id());

    let others = directory.active_except(&office_id()).expect("lookup");
    assert_eq!(others.len(), 3);
    assert_eq!(
        directory
            .by_login("bert")
            .expect("lookup")
            .map(|person| person.id),
        Some(boss_id())
    );
}

#[test]
fn administrative_changes_need_management_rights() {
    let store = seeded_store();
    let (directory, _notifier) = directory(store.clone());
    let office = actor(&store, &office_id());
    let user = actor(&store, &user_id());

    match directory.create_person(&user, identity("zoe"), roles(&[Role::User])) {
        Err(LeaveServiceError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }

    match directory.create_person(&office, identity("bert"), roles(&[Role::User])) {
        Err(LeaveServiceError::Rejected(Rejection::LoginTaken(login))) => assert_eq!(login, "bert"),
        other => panic!("expected login taken, got {other:?}"),
    }

    let zoe = directory
        .create_person(&office, identity("zoe"), roles(&[Role::User, Role::Boss]))
        .expect("office creates");
    assert!(zoe.has_role(Role::Boss));

    let promoted = directory
        .update_roles(&office, &user_id(), roles(&[Role::User, Role::Boss]))
        .expect("office promotes");
    assert!(promoted.has_role(Role::Boss));

    // persons manage their own subscriptions, not others'
    let subscribed = directory
        .update_notifications(&user, &user_id(), [MailNotification::Boss].into())
        .expect("own subscriptions");
    assert!(subscribed.has_notification(MailNotification::Boss));
    match directory.update_notifications(&user, &boss_id(), Default::default()) {
        Err(LeaveServiceError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }
}
