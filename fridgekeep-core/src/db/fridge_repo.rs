//! Fridge records, compartments and membership.
//!
//! # Sharing scope
//!
//! A fridge's member list is access-control metadata on the record held by
//! this device's store. Inviting someone grants them rights over *this copy*;
//! nothing is transmitted to their devices. Every member-visible edit goes
//! through [`FridgeRepository::apply_update`], which rewrites the one
//! canonical record in the local store.
//!
//! # Permissions
//!
//! | action                         | owner | member | other |
//! |--------------------------------|-------|--------|-------|
//! | read, `apply_update`           | yes   | yes    | no    |
//! | invite, remove another member  | yes   | no     | no    |
//! | remove self                    | never | yes    | -     |
//! | choose as own default          | yes   | yes    | no    |
//! | delete fridge                  | yes   | no     | no    |
//!
//! # Default fridge
//!
//! Each user has at most one default among the fridges they can see. The
//! choice lives under [`StoreKey::DefaultFridges`], keyed by user, and
//! `is_default` on a returned [`Fridge`] reflects the reader's choice. A user
//! with no valid choice falls back to the oldest fridge they own.

use std::collections::HashMap;
use std::sync::Arc;

use crate::clock::Clock;
use crate::db::{AccountRepository, IngredientRepository, NotificationRepository, StatisticsRepository};
use crate::error::RepoError;
use crate::models::{Compartment, CompartmentType, Fridge, FridgeMember, NotificationType, Role};
use crate::ordering;
use crate::session::Session;
use crate::store::{DocumentStore, StoreKey};

/// A member-visible edit to a fridge record.
#[derive(Debug, Clone)]
pub enum FridgeUpdate {
    SetMemo(String),
    Rename(String),
    SetFavorite(bool),
    AddCompartment {
        name: String,
        compartment_type: CompartmentType,
    },
    RenameCompartment {
        compartment_id: String,
        name: String,
    },
    /// Only allowed while no ingredient references the compartment.
    RemoveCompartment { compartment_id: String },
}

/// Outcome of a membership removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MembershipChange {
    /// The acting user removed themselves; the caller should leave any view
    /// of this fridge.
    pub left_self: bool,
}

type DefaultsByUser = HashMap<String, String>;

#[derive(Clone)]
pub struct FridgeRepository {
    store: DocumentStore,
    clock: Arc<dyn Clock>,
}

impl FridgeRepository {
    pub fn new(store: DocumentStore, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    fn load(&self) -> Vec<Fridge> {
        self.store.get_or_default(StoreKey::Fridges)
    }

    fn save(&self, fridges: &[Fridge]) -> Result<(), RepoError> {
        Ok(self.store.set(StoreKey::Fridges, fridges)?)
    }

    fn load_defaults(&self) -> DefaultsByUser {
        self.store.get_or_default(StoreKey::DefaultFridges)
    }

    /// Sets `is_default` on each fridge in `view` for `user_id`.
    fn mark_defaults(&self, user_id: &str, all: &[Fridge], view: &mut [Fridge]) {
        let default_id = default_for(&self.load_defaults(), all, user_id);
        for fridge in view.iter_mut() {
            fridge.is_default = default_id.as_deref() == Some(fridge.fridge_id.as_str());
        }
    }

    /// Drops stored default choices for which `stale` holds.
    fn prune_defaults(&self, stale: impl Fn(&str, &str) -> bool) -> Result<(), RepoError> {
        let mut defaults = self.load_defaults();
        let before = defaults.len();
        defaults.retain(|user_id, fridge_id| !stale(user_id.as_str(), fridge_id.as_str()));
        if defaults.len() != before {
            self.store.set(StoreKey::DefaultFridges, &defaults)?;
        }
        Ok(())
    }

    fn accounts(&self) -> AccountRepository {
        AccountRepository::new(self.store.clone(), self.clock.clone())
    }

    fn notifications(&self) -> NotificationRepository {
        NotificationRepository::new(self.store.clone(), self.clock.clone())
    }

    /// Creates a fridge owned by the signed-in user.
    ///
    /// `compartments` replaces the default COOL/FREEZE/PANTRY set when given.
    /// The user's first owned fridge becomes their default.
    pub fn create(
        &self,
        session: &Session,
        name: impl Into<String>,
        compartments: Option<Vec<(String, CompartmentType)>>,
    ) -> Result<Fridge, RepoError> {
        let user_id = session.require_user()?;
        let account = self
            .accounts()
            .get(user_id)
            .ok_or_else(|| RepoError::not_found(format!("Account {}", user_id)))?;

        let mut fridges = self.load();
        let mut fridge = Fridge::new(name, user_id, &account.nickname, self.clock.now());
        if let Some(custom) = compartments {
            fridge = fridge.with_compartments(
                custom
                    .into_iter()
                    .map(|(name, t)| Compartment::new(name, t))
                    .collect(),
            );
        }

        fridges.push(fridge.clone());
        self.save(&fridges)?;
        self.mark_defaults(user_id, &fridges, std::slice::from_mut(&mut fridge));

        tracing::info!(fridge_id = %fridge.fridge_id, user_id, "Created fridge");
        Ok(fridge)
    }

    /// Reads a fridge the signed-in user belongs to.
    pub fn get(&self, session: &Session, fridge_id: &str) -> Result<Fridge, RepoError> {
        let user_id = session.require_user()?;
        let mut fridge = self.member_fridge(user_id, fridge_id)?;
        self.mark_defaults(user_id, &self.load(), std::slice::from_mut(&mut fridge));
        Ok(fridge)
    }

    /// Every fridge the signed-in user belongs to, in creation order.
    pub fn list_for_user(&self, session: &Session) -> Result<Vec<Fridge>, RepoError> {
        let user_id = session.require_user()?;
        let all = self.load();
        let mut mine: Vec<Fridge> = all.iter().filter(|f| f.is_member(user_id)).cloned().collect();
        self.mark_defaults(user_id, &all, &mut mine);
        Ok(mine)
    }

    /// Applies a member-visible edit and rewrites the fridge record.
    pub fn apply_update(
        &self,
        session: &Session,
        fridge_id: &str,
        update: FridgeUpdate,
    ) -> Result<Fridge, RepoError> {
        let user_id = session.require_user()?;

        let mut fridges = self.load();
        let fridge = find_mut(&mut fridges, fridge_id)?;
        if !fridge.is_member(user_id) {
            return Err(RepoError::permission_denied("edit a fridge you are not a member of"));
        }

        if let FridgeUpdate::RemoveCompartment { compartment_id } = &update {
            if IngredientRepository::compartment_in_use(&self.store, fridge_id, compartment_id) {
                return Err(RepoError::permission_denied(
                    "remove a compartment that still holds ingredients",
                ));
            }
        }

        match update {
            FridgeUpdate::SetMemo(memo) => fridge.memo = memo,
            FridgeUpdate::Rename(name) => fridge.name = name,
            FridgeUpdate::SetFavorite(favorite) => fridge.is_favorite = favorite,
            FridgeUpdate::AddCompartment {
                name,
                compartment_type,
            } => {
                fridge.add_compartment(name, compartment_type);
            }
            FridgeUpdate::RenameCompartment {
                compartment_id,
                name,
            } => {
                let compartment = fridge
                    .compartments
                    .iter_mut()
                    .find(|c| c.compartment_id == compartment_id)
                    .ok_or_else(|| {
                        RepoError::not_found(format!("Compartment {}", compartment_id))
                    })?;
                compartment.name = name;
            }
            FridgeUpdate::RemoveCompartment { compartment_id } => {
                let before = fridge.compartments.len();
                fridge
                    .compartments
                    .retain(|c| c.compartment_id != compartment_id);
                if fridge.compartments.len() == before {
                    return Err(RepoError::not_found(format!(
                        "Compartment {}",
                        compartment_id
                    )));
                }
            }
        }

        let mut updated = fridge.clone();
        self.save(&fridges)?;
        self.mark_defaults(user_id, &fridges, std::slice::from_mut(&mut updated));
        tracing::debug!(fridge_id, user_id, "Updated fridge");
        Ok(updated)
    }

    /// Makes `fridge_id` the signed-in user's default, replacing their
    /// previous choice. Any member may pick a fridge they belong to; other
    /// users' defaults are unaffected.
    pub fn set_default(&self, session: &Session, fridge_id: &str) -> Result<(), RepoError> {
        let user_id = session.require_user()?;
        self.member_fridge(user_id, fridge_id)?;

        let mut defaults = self.load_defaults();
        defaults.insert(user_id.to_string(), fridge_id.to_string());
        self.store.set(StoreKey::DefaultFridges, &defaults)?;

        tracing::debug!(fridge_id, user_id, "Set default fridge");
        Ok(())
    }

    /// Adds `target_user_id` as a member.
    ///
    /// Returns `Ok(false)` if they already belong to the fridge. Only the
    /// owner may invite.
    pub fn invite(
        &self,
        session: &Session,
        fridge_id: &str,
        target_user_id: &str,
    ) -> Result<bool, RepoError> {
        let user_id = session.require_user()?;
        let accounts = self.accounts();
        let target = accounts
            .get(target_user_id)
            .ok_or_else(|| RepoError::not_found(format!("Account {}", target_user_id)))?;

        let mut fridges = self.load();
        let fridge = find_mut(&mut fridges, fridge_id)?;
        if !fridge.is_owner(user_id) {
            return Err(RepoError::permission_denied("only the owner can invite"));
        }
        if fridge.is_member(target_user_id) {
            return Ok(false);
        }

        fridge.members.push(FridgeMember {
            user_id: target.user_id.clone(),
            nickname: target.nickname.clone(),
            role: Role::Member,
        });
        let fridge_name = fridge.name.clone();
        self.save(&fridges)?;

        let inviter = accounts
            .get(user_id)
            .map(|a| a.nickname)
            .unwrap_or_else(|| user_id.to_string());
        self.notifications().push(
            target_user_id,
            NotificationType::FridgeInvite,
            format!("{} added you to '{}'", inviter, fridge_name),
        )?;

        tracing::info!(fridge_id, target_user_id, "Added fridge member");
        Ok(true)
    }

    /// Removes a member.
    ///
    /// The owner may remove anyone but themselves; a member may only remove
    /// themselves. Removing someone who is not a member is `NotFound` and
    /// leaves the list untouched.
    pub fn remove_member(
        &self,
        session: &Session,
        fridge_id: &str,
        target_user_id: &str,
    ) -> Result<MembershipChange, RepoError> {
        let user_id = session.require_user()?;
        let is_self = user_id == target_user_id;

        let mut fridges = self.load();
        let fridge = find_mut(&mut fridges, fridge_id)?;

        if !is_self && !fridge.is_owner(user_id) {
            return Err(RepoError::permission_denied("only the owner can remove other members"));
        }

        let member = fridge.member(target_user_id).ok_or_else(|| {
            RepoError::not_found(format!("Member {} of fridge {}", target_user_id, fridge_id))
        })?;
        if member.role == Role::Owner {
            return Err(RepoError::OwnerRemovalForbidden);
        }

        fridge.members.retain(|m| m.user_id != target_user_id);
        let fridge_name = fridge.name.clone();
        self.save(&fridges)?;
        self.prune_defaults(|user, fridge| user == target_user_id && fridge == fridge_id)?;

        if !is_self {
            self.notifications().push(
                target_user_id,
                NotificationType::FridgeRemoved,
                format!("You were removed from '{}'", fridge_name),
            )?;
        }

        tracing::info!(fridge_id, target_user_id, "Removed fridge member");
        Ok(MembershipChange { left_self: is_self })
    }

    /// Deletes a fridge and everything that hangs off it: its ingredients,
    /// its usage statistics and its place in stored orders.
    ///
    /// Anyone who had it as their default falls back to their oldest owned
    /// fridge.
    pub fn delete_fridge(&self, session: &Session, fridge_id: &str) -> Result<(), RepoError> {
        let user_id = session.require_user()?;
        let fridges = self.load();

        let fridge = fridges
            .iter()
            .find(|f| f.fridge_id == fridge_id)
            .ok_or_else(|| RepoError::not_found(format!("Fridge {}", fridge_id)))?;
        if !fridge.is_owner(user_id) {
            return Err(RepoError::permission_denied("only the owner can delete a fridge"));
        }

        self.delete_owned(fridges, &[fridge_id.to_string()])
    }

    /// Removes fridges by id with their dependent data, including any
    /// default choice that pointed at them.
    fn delete_owned(&self, mut fridges: Vec<Fridge>, ids: &[String]) -> Result<(), RepoError> {
        fridges.retain(|f| !ids.contains(&f.fridge_id));
        self.save(&fridges)?;
        self.prune_defaults(|_, fridge| ids.iter().any(|id| id == fridge))?;

        let removed = IngredientRepository::delete_for_fridges(&self.store, ids)?;
        let stats = StatisticsRepository::new(self.store.clone(), self.clock.clone());
        for id in ids {
            stats.forget_fridge(id)?;
            ordering::forget_fridge(&self.store, id)?;
        }

        tracing::info!(fridges = ids.len(), ingredients = removed, "Deleted fridge(s)");
        Ok(())
    }

    /// A fridge `user_id` belongs to.
    pub(crate) fn member_fridge(&self, user_id: &str, fridge_id: &str) -> Result<Fridge, RepoError> {
        let fridge = self
            .load()
            .into_iter()
            .find(|f| f.fridge_id == fridge_id)
            .ok_or_else(|| RepoError::not_found(format!("Fridge {}", fridge_id)))?;

        if !fridge.is_member(user_id) {
            return Err(RepoError::permission_denied("access a fridge you are not a member of"));
        }
        Ok(fridge)
    }

    /// Keeps member nicknames in step with a profile edit.
    pub(crate) fn rename_member(&self, user_id: &str, nickname: &str) -> Result<(), RepoError> {
        let mut fridges = self.load();
        let mut changed = false;
        for member in fridges
            .iter_mut()
            .flat_map(|f| f.members.iter_mut())
            .filter(|m| m.user_id == user_id && m.nickname != nickname)
        {
            member.nickname = nickname.to_string();
            changed = true;
        }
        if changed {
            self.save(&fridges)?;
        }
        Ok(())
    }

    /// Account deletion: deletes every fridge the user owns and drops their
    /// membership everywhere else. Returns the ids of deleted fridges.
    pub(crate) fn purge_user(&self, user_id: &str) -> Result<Vec<String>, RepoError> {
        let mut fridges = self.load();
        let owned: Vec<String> = fridges
            .iter()
            .filter(|f| f.is_owner(user_id))
            .map(|f| f.fridge_id.clone())
            .collect();

        for fridge in fridges.iter_mut() {
            fridge.members.retain(|m| m.user_id != user_id || m.role == Role::Owner);
        }

        self.delete_owned(fridges, &owned)?;
        self.prune_defaults(|user, _| user == user_id)?;
        Ok(owned)
    }
}

/// The fridge `user_id` treats as default: their stored choice while they
/// still belong to it, otherwise the oldest fridge they own.
fn default_for(defaults: &DefaultsByUser, fridges: &[Fridge], user_id: &str) -> Option<String> {
    defaults
        .get(user_id)
        .filter(|id| fridges.iter().any(|f| &f.fridge_id == *id && f.is_member(user_id)))
        .cloned()
        .or_else(|| {
            fridges
                .iter()
                .find(|f| f.is_owner(user_id))
                .map(|f| f.fridge_id.clone())
        })
}

fn find_mut<'a>(fridges: &'a mut [Fridge], fridge_id: &str) -> Result<&'a mut Fridge, RepoError> {
    fridges
        .iter_mut()
        .find(|f| f.fridge_id == fridge_id)
        .ok_or_else(|| RepoError::not_found(format!("Fridge {}", fridge_id)))
}
