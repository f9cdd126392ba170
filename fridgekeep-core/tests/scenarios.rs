//! End-to-end household scenarios against an in-memory store.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use fridgekeep_core::{
    freshness, Clock, FlushState, FridgeOrder, Household, IngredientState, ManualClock,
    NewAccount, NewIngredient, OrderSink, RepoError, Role, Session,
};

fn household() -> (Household, ManualClock) {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 3, 9, 30, 0).unwrap());
    (Household::in_memory(Arc::new(clock.clone())), clock)
}

fn sign_up(household: &Household, email: &str, nickname: &str) -> Session {
    let account = household
        .accounts
        .register(NewAccount::new(email, "pw1", nickname))
        .unwrap();
    Session::for_user(account.user_id)
}

#[derive(Clone, Default)]
struct CountingSink {
    sent: Arc<Mutex<Vec<FridgeOrder>>>,
}

impl OrderSink for CountingSink {
    fn send(&self, order: &FridgeOrder) {
        self.sent.lock().unwrap().push(order.clone());
    }
}

#[test]
fn milk_goes_from_near_expiry_to_expired() {
    let (household, clock) = household();
    let account = household
        .accounts
        .register(NewAccount::new("a@x.com", "pw1", "Alice"))
        .unwrap();
    let alice = household.sessions.login(&account).unwrap();

    let kitchen = household.fridges.create(&alice, "Kitchen", None).unwrap();
    assert!(kitchen.is_default);
    assert_eq!(kitchen.compartments.len(), 3);

    let today = clock.now().date_naive();
    let milk = household
        .ingredients
        .add(
            &alice,
            &kitchen.fridge_id,
            &kitchen.compartments[0].compartment_id,
            NewIngredient::new("Milk", today + chrono::Duration::days(2)),
        )
        .unwrap();
    assert_eq!(milk.state, IngredientState::NearExpiry);

    clock.advance(chrono::Duration::days(5));
    let reread = household.ingredients.get(&alice, &milk.ingredient_id).unwrap();
    assert_eq!(reread.state, IngredientState::Expired);
}

#[test]
fn freshness_is_pure() {
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 23, 59, 0).unwrap();
    let dates: Vec<_> = (-5..10)
        .map(|d| now.date_naive() + chrono::Duration::days(d))
        .collect();

    let forward: Vec<_> = dates.iter().map(|d| freshness::derive_state(*d, now)).collect();
    for (i, date) in dates.iter().enumerate().rev() {
        let state = freshness::derive_state(*date, now);
        assert_eq!(state, forward[i]);

        let expected = match freshness::days_until(*date, now) {
            d if d < 0 => IngredientState::Expired,
            d if d <= 3 => IngredientState::NearExpiry,
            _ => IngredientState::Fresh,
        };
        assert_eq!(state, expected);
    }
}

#[test]
fn duplicate_email_is_rejected() {
    let (household, _clock) = household();
    sign_up(&household, "a@x.com", "Alice");

    let second = household
        .accounts
        .register(NewAccount::new("a@x.com", "pw2", "Other"));
    assert!(matches!(second, Err(RepoError::DuplicateEmail(_))));
    assert_eq!(household.accounts.count(), 1);
}

#[test]
fn invite_then_leave() {
    let (household, _clock) = household();
    let alice = sign_up(&household, "a@x.com", "Alice");
    let bob = sign_up(&household, "b@x.com", "Bob");
    let bob_id = bob.user_id().unwrap().to_string();

    let fridge = household.fridges.create(&alice, "Kitchen", None).unwrap();
    household
        .fridges
        .invite(&alice, &fridge.fridge_id, &bob_id)
        .unwrap();

    let shared = household.fridges.get(&bob, &fridge.fridge_id).unwrap();
    assert_eq!(shared.members.len(), 2);
    assert_eq!(shared.members.iter().filter(|m| m.role == Role::Owner).count(), 1);

    let change = household
        .fridges
        .remove_member(&bob, &fridge.fridge_id, &bob_id)
        .unwrap();
    assert!(change.left_self);

    let members = household.fridges.get(&alice, &fridge.fridge_id).unwrap().members;
    assert_eq!(members.len(), 1);

    let again = household
        .fridges
        .remove_member(&bob, &fridge.fridge_id, &bob_id);
    assert!(matches!(again, Err(RepoError::NotFound(_))));
    assert_eq!(
        household.fridges.get(&alice, &fridge.fridge_id).unwrap().members,
        members
    );
}

#[test]
fn owner_removal_is_always_rejected() {
    let (household, _clock) = household();
    let alice = sign_up(&household, "a@x.com", "Alice");
    let alice_id = alice.user_id().unwrap().to_string();
    let fridge = household.fridges.create(&alice, "Kitchen", None).unwrap();

    let result = household
        .fridges
        .remove_member(&alice, &fridge.fridge_id, &alice_id);
    assert!(matches!(result, Err(RepoError::OwnerRemovalForbidden)));
}

#[test]
fn exactly_one_default_per_owner() {
    let (household, _clock) = household();
    let alice = sign_up(&household, "a@x.com", "Alice");
    let ids: Vec<String> = ["Kitchen", "Garage", "Office"]
        .iter()
        .map(|name| household.fridges.create(&alice, *name, None).unwrap().fridge_id)
        .collect();

    let defaults = |household: &Household| {
        household
            .fridges
            .list_for_user(&alice)
            .unwrap()
            .into_iter()
            .filter(|f| f.is_default)
            .map(|f| f.fridge_id)
            .collect::<Vec<_>>()
    };

    assert_eq!(defaults(&household), vec![ids[0].clone()]);
    household.fridges.set_default(&alice, &ids[2]).unwrap();
    assert_eq!(defaults(&household), vec![ids[2].clone()]);

    household.fridges.delete_fridge(&alice, &ids[2]).unwrap();
    assert_eq!(defaults(&household), vec![ids[0].clone()]);
}

#[test]
fn shared_fridge_does_not_add_a_second_default() {
    let (household, _clock) = household();
    let alice = sign_up(&household, "a@x.com", "Alice");
    let bob = sign_up(&household, "b@x.com", "Bob");
    let kitchen = household.fridges.create(&alice, "Kitchen", None).unwrap();
    let cellar = household.fridges.create(&bob, "Cellar", None).unwrap();
    household
        .fridges
        .invite(&alice, &kitchen.fridge_id, bob.user_id().unwrap())
        .unwrap();

    let bobs_defaults: Vec<String> = household
        .fridges
        .list_for_user(&bob)
        .unwrap()
        .into_iter()
        .filter(|f| f.is_default)
        .map(|f| f.fridge_id)
        .collect();
    assert_eq!(bobs_defaults, vec![cellar.fridge_id]);
}

#[test]
fn reorder_burst_produces_single_remote_write() {
    let (household, clock) = household();
    let alice = sign_up(&household, "a@x.com", "Alice");
    let ids: Vec<String> = ["A", "B", "C"]
        .iter()
        .map(|name| household.fridges.create(&alice, *name, None).unwrap().fridge_id)
        .collect();

    let sink = CountingSink::default();
    let mut coordinator = household.order_coordinator(sink.clone(), Duration::from_millis(3000));
    coordinator.load(&alice, &ids).unwrap();

    let orders = [
        vec![ids[1].clone(), ids[0].clone(), ids[2].clone()],
        vec![ids[2].clone(), ids[1].clone(), ids[0].clone()],
        vec![ids[2].clone(), ids[0].clone(), ids[1].clone()],
    ];
    for order in &orders {
        coordinator.reorder(&alice, order.clone()).unwrap();
        // Local truth updates right away.
        assert_eq!(coordinator.load(&alice, &ids).unwrap().fridge_ids, *order);
        clock.advance(chrono::Duration::milliseconds(500));
        coordinator.poll();
    }
    assert_eq!(coordinator.state(), FlushState::PendingRemoteFlush);

    clock.advance(chrono::Duration::milliseconds(3000));
    coordinator.poll();

    let sent = sink.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].fridge_ids, orders[2]);
}

#[test]
fn deleting_a_fridge_drops_it_from_the_order() {
    let (household, _clock) = household();
    let alice = sign_up(&household, "a@x.com", "Alice");
    let a = household.fridges.create(&alice, "A", None).unwrap().fridge_id;
    let b = household.fridges.create(&alice, "B", None).unwrap().fridge_id;

    let mut coordinator = household.order_coordinator(CountingSink::default(), Duration::from_millis(3000));
    coordinator
        .reorder(&alice, vec![b.clone(), a.clone()])
        .unwrap();
    household.fridges.delete_fridge(&alice, &b).unwrap();

    let order = coordinator.load(&alice, &[a.clone()]).unwrap();
    assert_eq!(order.fridge_ids, vec![a]);
}

#[test]
fn unreadable_collection_is_treated_as_empty() {
    use fridgekeep_core::store::{BlobMedium, MemoryMedium};
    use fridgekeep_core::{DocumentStore, StoreKey};

    let medium = MemoryMedium::new();
    medium.write(StoreKey::Accounts.as_str(), "{not json").unwrap();
    let household = Household::new(
        DocumentStore::new(medium),
        Arc::new(ManualClock::new(Utc::now())),
    );

    assert_eq!(household.accounts.count(), 0);
    household
        .accounts
        .register(NewAccount::new("a@x.com", "pw1", "Alice"))
        .unwrap();
    assert_eq!(household.accounts.count(), 1);
}
