use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use uuid::Uuid;

use crate::clock::Clock;
use crate::db::{FridgeRepository, NotificationRepository, StatisticsRepository};
use crate::error::RepoError;
use crate::models::{
    Fridge, Ingredient, IngredientState, IngredientUpdate, NewIngredient, NotificationType,
    StatEvent,
};
use crate::session::Session;
use crate::store::{DocumentStore, StoreKey};

const UNCATEGORIZED: &str = "uncategorized";

/// Ingredients across every fridge, with freshness derived on read.
///
/// Any member of a fridge may add and change its ingredients. Statistics
/// are credited to the acting user.
#[derive(Clone)]
pub struct IngredientRepository {
    store: DocumentStore,
    clock: Arc<dyn Clock>,
}

impl IngredientRepository {
    pub fn new(store: DocumentStore, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    fn load(&self) -> Vec<Ingredient> {
        self.store.get_or_default(StoreKey::Ingredients)
    }

    fn save(&self, ingredients: &[Ingredient]) -> Result<(), RepoError> {
        Ok(self.store.set(StoreKey::Ingredients, ingredients)?)
    }

    fn fridges(&self) -> FridgeRepository {
        FridgeRepository::new(self.store.clone(), self.clock.clone())
    }

    fn stats(&self) -> StatisticsRepository {
        StatisticsRepository::new(self.store.clone(), self.clock.clone())
    }

    /// Loads and re-derives every active ingredient's state for now.
    fn load_fresh(&self) -> Vec<Ingredient> {
        let now = self.clock.now();
        let mut ingredients = self.load();
        for ingredient in ingredients.iter_mut() {
            ingredient.refresh_state(now);
        }
        ingredients
    }

    pub fn add(
        &self,
        session: &Session,
        fridge_id: &str,
        compartment_id: &str,
        input: NewIngredient,
    ) -> Result<Ingredient, RepoError> {
        let user_id = session.require_user()?;
        let fridge = self.fridges().member_fridge(user_id, fridge_id)?;
        require_compartment(&fridge, compartment_id)?;
        validate_quantity(input.quantity)?;

        let now = self.clock.now();
        let mut ingredient = Ingredient {
            ingredient_id: Uuid::new_v4().to_string(),
            fridge_id: fridge.fridge_id.clone(),
            compartment_id: compartment_id.to_string(),
            name: input.name,
            category: input.category,
            quantity: input.quantity,
            unit: input.unit,
            expiration_date: input.expiration_date,
            state: IngredientState::Fresh,
            memo: input.memo,
            created_at: now,
        };
        ingredient.refresh_state(now);

        let mut ingredients = self.load();
        ingredients.push(ingredient.clone());
        self.save(&ingredients)?;

        self.stats()
            .record(user_id, StatEvent::Added, &fridge.fridge_id, &fridge.name)?;

        tracing::debug!(
            ingredient_id = %ingredient.ingredient_id,
            fridge_id,
            state = %ingredient.state,
            "Added ingredient"
        );
        Ok(ingredient)
    }

    pub fn get(&self, session: &Session, ingredient_id: &str) -> Result<Ingredient, RepoError> {
        let user_id = session.require_user()?;
        let ingredient = self
            .load_fresh()
            .into_iter()
            .find(|i| i.ingredient_id == ingredient_id)
            .ok_or_else(|| RepoError::not_found(format!("Ingredient {}", ingredient_id)))?;
        self.fridges().member_fridge(user_id, &ingredient.fridge_id)?;
        Ok(ingredient)
    }

    /// Every ingredient in a fridge, terminal ones included, ordered by
    /// expiration date.
    pub fn list_for_fridge(
        &self,
        session: &Session,
        fridge_id: &str,
    ) -> Result<Vec<Ingredient>, RepoError> {
        let user_id = session.require_user()?;
        self.fridges().member_fridge(user_id, fridge_id)?;

        let mut list: Vec<Ingredient> = self
            .load_fresh()
            .into_iter()
            .filter(|i| i.fridge_id == fridge_id)
            .collect();
        list.sort_by_key(|i| i.expiration_date);
        Ok(list)
    }

    pub fn list_for_compartment(
        &self,
        session: &Session,
        fridge_id: &str,
        compartment_id: &str,
    ) -> Result<Vec<Ingredient>, RepoError> {
        let list = self.list_for_fridge(session, fridge_id)?;
        Ok(list
            .into_iter()
            .filter(|i| i.compartment_id == compartment_id)
            .collect())
    }

    /// Edits an active ingredient. A new expiration date re-derives state.
    pub fn update(
        &self,
        session: &Session,
        ingredient_id: &str,
        update: IngredientUpdate,
    ) -> Result<Ingredient, RepoError> {
        if let Some(quantity) = update.quantity {
            validate_quantity(quantity)?;
        }
        self.modify(session, ingredient_id, "edit", |ingredient, _| {
            update.apply(ingredient);
            Ok(())
        })
    }

    pub fn move_to_compartment(
        &self,
        session: &Session,
        ingredient_id: &str,
        compartment_id: &str,
    ) -> Result<Ingredient, RepoError> {
        self.modify(session, ingredient_id, "move", |ingredient, fridge| {
            require_compartment(fridge, compartment_id)?;
            ingredient.compartment_id = compartment_id.to_string();
            Ok(())
        })
    }

    pub fn consume(&self, session: &Session, ingredient_id: &str) -> Result<Ingredient, RepoError> {
        self.finish(session, ingredient_id, IngredientState::Consumed)
    }

    pub fn dispose(&self, session: &Session, ingredient_id: &str) -> Result<Ingredient, RepoError> {
        self.finish(session, ingredient_id, IngredientState::Disposed)
    }

    /// Removes the record outright. Not counted in statistics.
    pub fn delete(&self, session: &Session, ingredient_id: &str) -> Result<(), RepoError> {
        let user_id = session.require_user()?;
        let mut ingredients = self.load();
        let position = ingredients
            .iter()
            .position(|i| i.ingredient_id == ingredient_id)
            .ok_or_else(|| RepoError::not_found(format!("Ingredient {}", ingredient_id)))?;
        self.fridges()
            .member_fridge(user_id, &ingredients[position].fridge_id)?;

        ingredients.remove(position);
        self.save(&ingredients)?;
        tracing::debug!(ingredient_id, "Deleted ingredient");
        Ok(())
    }

    /// Count of active ingredients per category. Empty categories are
    /// grouped under "uncategorized".
    pub fn category_summary(
        &self,
        session: &Session,
        fridge_id: &str,
    ) -> Result<BTreeMap<String, usize>, RepoError> {
        let mut summary = BTreeMap::new();
        for ingredient in self
            .list_for_fridge(session, fridge_id)?
            .iter()
            .filter(|i| i.is_active())
        {
            let category = match ingredient.category.trim() {
                "" => UNCATEGORIZED,
                c => c,
            };
            *summary.entry(category.to_string()).or_insert(0) += 1;
        }
        Ok(summary)
    }

    /// Active ingredients in any of the user's fridges expiring within
    /// `within_days` (already expired ones included), soonest first.
    pub fn expiring_soon(
        &self,
        session: &Session,
        within_days: i64,
    ) -> Result<Vec<Ingredient>, RepoError> {
        let fridge_ids: HashSet<String> = self
            .fridges()
            .list_for_user(session)?
            .into_iter()
            .map(|f| f.fridge_id)
            .collect();

        let now = self.clock.now();
        let mut list: Vec<Ingredient> = self
            .load_fresh()
            .into_iter()
            .filter(|i| fridge_ids.contains(&i.fridge_id))
            .filter(|i| i.is_active() && i.days_until_expiry(now) <= within_days)
            .collect();
        list.sort_by_key(|i| i.expiration_date);
        Ok(list)
    }

    /// Pushes one EXPIRY_WARNING summarising ingredients within `within_days`.
    /// Returns how many ingredients it covered.
    pub fn notify_expiring(&self, session: &Session, within_days: i64) -> Result<usize, RepoError> {
        let user_id = session.require_user()?;
        let expiring = self.expiring_soon(session, within_days)?;
        if expiring.is_empty() {
            return Ok(0);
        }

        let names: Vec<&str> = expiring.iter().map(|i| i.name.as_str()).collect();
        let message = format!(
            "{} ingredient(s) expiring soon: {}",
            expiring.len(),
            names.join(", ")
        );
        NotificationRepository::new(self.store.clone(), self.clock.clone()).push(
            user_id,
            NotificationType::ExpiryWarning,
            message,
        )?;
        Ok(expiring.len())
    }

    /// Persists re-derived states so stored values match the clock.
    /// Returns how many records changed.
    pub fn refresh_states(&self) -> Result<usize, RepoError> {
        let now = self.clock.now();
        let mut ingredients = self.load();
        let changed = ingredients
            .iter_mut()
            .map(|i| i.refresh_state(now))
            .filter(|c| *c)
            .count();
        if changed > 0 {
            self.save(&ingredients)?;
            tracing::info!(changed, "Refreshed ingredient states");
        }
        Ok(changed)
    }

    fn finish(
        &self,
        session: &Session,
        ingredient_id: &str,
        target: IngredientState,
    ) -> Result<Ingredient, RepoError> {
        let (action, event) = match target {
            IngredientState::Consumed => ("consume", StatEvent::Consumed),
            _ => ("dispose", StatEvent::Disposed),
        };

        let mut fridge_name = String::new();
        let ingredient = self.modify(session, ingredient_id, action, |ingredient, fridge| {
            ingredient.state = target;
            fridge_name = fridge.name.clone();
            Ok(())
        })?;

        if let Some(user_id) = session.user_id() {
            self.stats()
                .record(user_id, event, &ingredient.fridge_id, &fridge_name)?;
        }
        Ok(ingredient)
    }

    /// Read-modify-write for one active ingredient the user can reach.
    /// Terminal ingredients reject every change with `InvalidTransition`.
    fn modify<F>(
        &self,
        session: &Session,
        ingredient_id: &str,
        action: &'static str,
        change: F,
    ) -> Result<Ingredient, RepoError>
    where
        F: FnOnce(&mut Ingredient, &Fridge) -> Result<(), RepoError>,
    {
        let user_id = session.require_user()?;
        let now = self.clock.now();
        let mut ingredients = self.load();
        let ingredient = ingredients
            .iter_mut()
            .find(|i| i.ingredient_id == ingredient_id)
            .ok_or_else(|| RepoError::not_found(format!("Ingredient {}", ingredient_id)))?;
        let fridge = self.fridges().member_fridge(user_id, &ingredient.fridge_id)?;

        if ingredient.state.is_terminal() {
            return Err(RepoError::InvalidTransition {
                from: ingredient.state,
                action,
            });
        }

        change(ingredient, &fridge)?;
        ingredient.refresh_state(now);
        let updated = ingredient.clone();
        self.save(&ingredients)?;

        tracing::debug!(ingredient_id, action, state = %updated.state, "Changed ingredient");
        Ok(updated)
    }

    pub(crate) fn compartment_in_use(
        store: &DocumentStore,
        fridge_id: &str,
        compartment_id: &str,
    ) -> bool {
        store
            .get_or_default::<Vec<Ingredient>>(StoreKey::Ingredients)
            .iter()
            .any(|i| i.fridge_id == fridge_id && i.compartment_id == compartment_id)
    }

    /// Drops every ingredient that belongs to one of `fridge_ids`.
    pub(crate) fn delete_for_fridges(
        store: &DocumentStore,
        fridge_ids: &[String],
    ) -> Result<usize, RepoError> {
        let mut ingredients: Vec<Ingredient> = store.get_or_default(StoreKey::Ingredients);
        let before = ingredients.len();
        ingredients.retain(|i| !fridge_ids.contains(&i.fridge_id));
        let removed = before - ingredients.len();
        if removed > 0 {
            store.set(StoreKey::Ingredients, &ingredients)?;
        }
        Ok(removed)
    }
}

fn require_compartment(fridge: &Fridge, compartment_id: &str) -> Result<(), RepoError> {
    fridge
        .compartment(compartment_id)
        .map(|_| ())
        .ok_or_else(|| RepoError::not_found(format!("Compartment {}", compartment_id)))
}

/// Quantities must be finite and non-negative. JSON has no encoding for NaN
/// or infinity, so storing one would make the whole collection unreadable.
fn validate_quantity(quantity: f64) -> Result<(), RepoError> {
    if !quantity.is_finite() {
        return Err(RepoError::invalid_input(format!(
            "quantity must be a finite number, got {}",
            quantity
        )));
    }
    if quantity < 0.0 {
        return Err(RepoError::invalid_input(format!(
            "quantity cannot be negative, got {}",
            quantity
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::TestContext;
    use chrono::{Duration, NaiveDate};

    struct Fixture {
        ctx: TestContext,
        repo: IngredientRepository,
        alice: Session,
        fridge: Fridge,
    }

    impl Fixture {
        fn cool(&self) -> &str {
            &self.fridge.compartments[0].compartment_id
        }

        fn days_from_now(&self, days: i64) -> NaiveDate {
            self.ctx.clock.now().date_naive() + Duration::days(days)
        }

        fn add(&self, name: &str, days: i64) -> Ingredient {
            self.repo
                .add(
                    &self.alice,
                    &self.fridge.fridge_id,
                    self.cool(),
                    NewIngredient::new(name, self.days_from_now(days)),
                )
                .unwrap()
        }
    }

    fn setup() -> Fixture {
        let ctx = TestContext::new();
        let alice = ctx.seed_account("alice", "Alice");
        let fridge = FridgeRepository::new(ctx.store.clone(), ctx.clock())
            .create(&alice, "Kitchen", None)
            .unwrap();
        let repo = IngredientRepository::new(ctx.store.clone(), ctx.clock());
        Fixture {
            ctx,
            repo,
            alice,
            fridge,
        }
    }

    #[test]
    fn test_add_derives_state() {
        let f = setup();
        assert_eq!(f.add("Milk", 2).state, IngredientState::NearExpiry);
        assert_eq!(f.add("Rice", 30).state, IngredientState::Fresh);
        assert_eq!(f.add("Tofu", -1).state, IngredientState::Expired);
    }

    #[test]
    fn test_state_recomputed_on_read() {
        let f = setup();
        let milk = f.add("Milk", 2);

        f.ctx.clock.advance(Duration::days(5));
        let reread = f.repo.get(&f.alice, &milk.ingredient_id).unwrap();
        assert_eq!(reread.state, IngredientState::Expired);
    }

    #[test]
    fn test_refresh_states_persists() {
        let f = setup();
        f.add("Milk", 2);
        f.add("Rice", 30);

        f.ctx.clock.advance(Duration::days(5));
        assert_eq!(f.repo.refresh_states().unwrap(), 1);
        assert_eq!(f.repo.refresh_states().unwrap(), 0);

        let stored: Vec<Ingredient> = f.ctx.store.get_or_default(StoreKey::Ingredients);
        assert_eq!(stored[0].state, IngredientState::Expired);
    }

    #[test]
    fn test_add_unknown_compartment() {
        let f = setup();
        let result = f.repo.add(
            &f.alice,
            &f.fridge.fridge_id,
            "nope",
            NewIngredient::new("Milk", f.days_from_now(2)),
        );
        assert!(matches!(result, Err(RepoError::NotFound(_))));
    }

    #[test]
    fn test_non_finite_quantity_rejected_and_collection_kept() {
        let f = setup();
        f.add("Eggs", 10);
        f.add("Milk", 3);

        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -1.0] {
            let result = f.repo.add(
                &f.alice,
                &f.fridge.fridge_id,
                f.cool(),
                NewIngredient::new("Butter", f.days_from_now(20)).with_quantity(bad, "g"),
            );
            assert!(matches!(result, Err(RepoError::InvalidInput(_))));
        }

        f.add("Jam", 60);
        let names: Vec<String> = f
            .repo
            .list_for_fridge(&f.alice, &f.fridge.fridge_id)
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["Milk", "Eggs", "Jam"]);
    }

    #[test]
    fn test_update_rejects_non_finite_quantity() {
        let f = setup();
        let milk = f.add("Milk", 3);

        let result = f.repo.update(
            &f.alice,
            &milk.ingredient_id,
            IngredientUpdate {
                quantity: Some(f64::NAN),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(RepoError::InvalidInput(_))));

        let stored = f.repo.get(&f.alice, &milk.ingredient_id).unwrap();
        assert_eq!(stored.quantity, 1.0);
    }

    #[test]
    fn test_non_member_cannot_add() {
        let f = setup();
        let bob = f.ctx.seed_account("bob", "Bob");
        let result = f.repo.add(
            &bob,
            &f.fridge.fridge_id,
            f.cool(),
            NewIngredient::new("Milk", f.days_from_now(2)),
        );
        assert!(matches!(result, Err(RepoError::PermissionDenied(_))));
    }

    #[test]
    fn test_terminal_states_are_final() {
        let f = setup();
        let milk = f.add("Milk", 5);
        let id = &milk.ingredient_id;

        let disposed = f.repo.dispose(&f.alice, id).unwrap();
        assert_eq!(disposed.state, IngredientState::Disposed);

        assert!(matches!(
            f.repo.consume(&f.alice, id),
            Err(RepoError::InvalidTransition {
                from: IngredientState::Disposed,
                ..
            })
        ));
        assert!(matches!(
            f.repo.update(
                &f.alice,
                id,
                IngredientUpdate {
                    expiration_date: Some(f.days_from_now(30)),
                    ..Default::default()
                }
            ),
            Err(RepoError::InvalidTransition { .. })
        ));

        // Terminal state survives the date passing.
        f.ctx.clock.advance(Duration::days(30));
        assert_eq!(
            f.repo.get(&f.alice, id).unwrap().state,
            IngredientState::Disposed
        );
    }

    #[test]
    fn test_update_expiration_rederives() {
        let f = setup();
        let milk = f.add("Milk", 2);

        let updated = f
            .repo
            .update(
                &f.alice,
                &milk.ingredient_id,
                IngredientUpdate {
                    expiration_date: Some(f.days_from_now(10)),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.state, IngredientState::Fresh);
    }

    #[test]
    fn test_move_to_compartment() {
        let f = setup();
        let milk = f.add("Milk", 2);
        let freeze = f.fridge.compartments[1].compartment_id.clone();

        let moved = f
            .repo
            .move_to_compartment(&f.alice, &milk.ingredient_id, &freeze)
            .unwrap();
        assert_eq!(moved.compartment_id, freeze);
        assert_eq!(
            f.repo
                .list_for_compartment(&f.alice, &f.fridge.fridge_id, &freeze)
                .unwrap()
                .len(),
            1
        );
        assert!(matches!(
            f.repo.move_to_compartment(&f.alice, &milk.ingredient_id, "nope"),
            Err(RepoError::NotFound(_))
        ));
    }

    #[test]
    fn test_statistics_mapping() {
        let f = setup();
        let a = f.add("Milk", 2);
        let b = f.add("Eggs", 7);
        let c = f.add("Tofu", 1);

        f.repo.consume(&f.alice, &a.ingredient_id).unwrap();
        f.repo.dispose(&f.alice, &b.ingredient_id).unwrap();
        f.repo.delete(&f.alice, &c.ingredient_id).unwrap();

        let stats = StatisticsRepository::new(f.ctx.store.clone(), f.ctx.clock())
            .statistics(&f.alice)
            .unwrap();
        assert_eq!(stats.weekly.added, 3);
        assert_eq!(stats.weekly.consumed, 1);
        assert_eq!(stats.weekly.disposed, 1);
        let most = stats.most_used_fridge.unwrap();
        assert_eq!(most.fridge_id, f.fridge.fridge_id);
        assert_eq!(most.count, 3);
    }

    #[test]
    fn test_delete_missing() {
        let f = setup();
        assert!(matches!(
            f.repo.delete(&f.alice, "missing"),
            Err(RepoError::NotFound(_))
        ));
    }

    #[test]
    fn test_category_summary_counts_active_only() {
        let f = setup();
        let id = &f.fridge.fridge_id;
        let add = |name: &str, category: &str| {
            f.repo
                .add(
                    &f.alice,
                    id,
                    f.cool(),
                    NewIngredient::new(name, f.days_from_now(5)).with_category(category),
                )
                .unwrap()
        };
        add("Milk", "dairy");
        let cheese = add("Cheese", "dairy");
        add("Apple", "fruit");
        add("Mystery", "");

        f.repo.consume(&f.alice, &cheese.ingredient_id).unwrap();

        let summary = f.repo.category_summary(&f.alice, id).unwrap();
        assert_eq!(summary.get("dairy"), Some(&1));
        assert_eq!(summary.get("fruit"), Some(&1));
        assert_eq!(summary.get(UNCATEGORIZED), Some(&1));
    }

    #[test]
    fn test_expiring_soon_sorted_and_filtered() {
        let f = setup();
        f.add("Rice", 30);
        f.add("Eggs", 3);
        f.add("Milk", 1);
        let gone = f.add("Tofu", 0);
        f.repo.consume(&f.alice, &gone.ingredient_id).unwrap();

        let names: Vec<String> = f
            .repo
            .expiring_soon(&f.alice, 3)
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["Milk", "Eggs"]);
    }

    #[test]
    fn test_notify_expiring() {
        let f = setup();
        f.add("Milk", 1);
        f.add("Rice", 30);

        assert_eq!(f.repo.notify_expiring(&f.alice, 3).unwrap(), 1);
        let inbox = NotificationRepository::new(f.ctx.store.clone(), f.ctx.clock())
            .list(&f.alice)
            .unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].notification_type, NotificationType::ExpiryWarning);
        assert!(inbox[0].message.contains("Milk"));
    }

    #[test]
    fn test_delete_for_fridges() {
        let f = setup();
        f.add("Milk", 1);
        f.add("Rice", 30);

        let removed =
            IngredientRepository::delete_for_fridges(&f.ctx.store, &[f.fridge.fridge_id.clone()])
                .unwrap();
        assert_eq!(removed, 2);
        assert!(f
            .repo
            .list_for_fridge(&f.alice, &f.fridge.fridge_id)
            .unwrap()
            .is_empty());
    }
}
