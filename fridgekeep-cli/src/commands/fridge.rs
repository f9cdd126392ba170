//! Fridge management commands.

use clap::{Args, Subcommand};
use std::sync::Arc;

use fridgekeep_core::ordering::reconcile;
use fridgekeep_core::{
    CompartmentType, Fridge, FridgeUpdate, Household, HttpOrderSink, NoopSink, OrderSink, Role,
    Session,
};

use super::{require_session, resolve_compartment, resolve_fridge, CommandResult};
use crate::config::Config;

/// Manage fridges, their compartments and members
#[derive(Args)]
pub struct FridgeCommand {
    #[command(subcommand)]
    pub command: FridgeSubcommand,
}

#[derive(Subcommand)]
pub enum FridgeSubcommand {
    /// Create a fridge with the default compartments
    Create {
        name: String,
        /// Custom compartments as NAME:TYPE (cool, freeze, pantry), repeatable
        #[arg(long = "compartment", value_parser = parse_compartment)]
        compartments: Vec<(String, CompartmentType)>,
    },
    /// List your fridges in your saved order
    List,
    /// Show a fridge's compartments and members
    Show { fridge: String },
    /// Set the fridge memo
    Memo { fridge: String, memo: String },
    /// Rename a fridge
    Rename { fridge: String, name: String },
    /// Mark or unmark as favorite
    Favorite {
        fridge: String,
        #[arg(long)]
        off: bool,
    },
    /// Make this your default fridge
    Default { fridge: String },
    /// Add a member by email
    Invite { fridge: String, email: String },
    /// Remove a member by email, or yourself with --leave
    RemoveMember {
        fridge: String,
        #[arg(required_unless_present = "leave")]
        email: Option<String>,
        #[arg(long)]
        leave: bool,
    },
    /// Delete a fridge and its ingredients
    Delete {
        fridge: String,
        #[arg(long, short)]
        force: bool,
    },
    /// Save a new order for your fridge list
    Reorder {
        /// Fridge ids or names, first to last
        #[arg(required = true)]
        fridges: Vec<String>,
    },
    /// Manage compartments
    Compartment {
        #[command(subcommand)]
        command: CompartmentSubcommand,
    },
}

#[derive(Subcommand)]
pub enum CompartmentSubcommand {
    /// Add a compartment
    Add {
        fridge: String,
        name: String,
        #[arg(long = "type", default_value = "cool")]
        compartment_type: CompartmentType,
    },
    /// Rename a compartment
    Rename {
        fridge: String,
        compartment: String,
        name: String,
    },
    /// Remove an empty compartment
    Remove { fridge: String, compartment: String },
}

fn parse_compartment(s: &str) -> Result<(String, CompartmentType), String> {
    let (name, kind) = s
        .rsplit_once(':')
        .ok_or_else(|| format!("Expected NAME:TYPE, got '{}'", s))?;
    if name.trim().is_empty() {
        return Err(format!("Compartment name is empty in '{}'", s));
    }
    Ok((name.trim().to_string(), kind.parse()?))
}

impl FridgeCommand {
    pub fn run(&self, household: &Household, config: &Config) -> CommandResult {
        let session = require_session(household)?;
        let fridges = &household.fridges;

        match &self.command {
            FridgeSubcommand::Create { name, compartments } => {
                let custom = (!compartments.is_empty()).then(|| compartments.clone());
                let fridge = fridges.create(&session, name, custom)?;
                println!("✓ Created fridge '{}'", fridge.name);
                println!("  id: {}", fridge.fridge_id);
                if fridge.is_default {
                    println!("  This is your default fridge.");
                }
            }

            FridgeSubcommand::List => self.list(household, &session)?,

            FridgeSubcommand::Show { fridge } => {
                let fridge = resolve_fridge(household, &session, fridge)?;
                print_fridge(household, &session, &fridge)?;
            }

            FridgeSubcommand::Memo { fridge, memo } => {
                self.update(household, &session, fridge, FridgeUpdate::SetMemo(memo.clone()))?;
            }

            FridgeSubcommand::Rename { fridge, name } => {
                self.update(household, &session, fridge, FridgeUpdate::Rename(name.clone()))?;
            }

            FridgeSubcommand::Favorite { fridge, off } => {
                self.update(household, &session, fridge, FridgeUpdate::SetFavorite(!off))?;
            }

            FridgeSubcommand::Default { fridge } => {
                let fridge = resolve_fridge(household, &session, fridge)?;
                fridges.set_default(&session, &fridge.fridge_id)?;
                println!("✓ '{}' is now your default fridge", fridge.name);
            }

            FridgeSubcommand::Invite { fridge, email } => {
                let fridge = resolve_fridge(household, &session, fridge)?;
                let target = household
                    .accounts
                    .find_by_email(email)
                    .ok_or_else(|| format!("No account with email '{}'", email))?;
                if fridges.invite(&session, &fridge.fridge_id, &target.user_id)? {
                    println!("✓ Added {} to '{}'", target.nickname, fridge.name);
                } else {
                    println!("{} is already a member of '{}'", target.nickname, fridge.name);
                }
            }

            FridgeSubcommand::RemoveMember {
                fridge,
                email,
                leave,
            } => {
                let fridge = resolve_fridge(household, &session, fridge)?;
                let target_id = match (leave, email) {
                    (true, _) => session.require_user()?.to_string(),
                    (false, Some(email)) => household
                        .accounts
                        .find_by_email(email)
                        .map(|a| a.user_id)
                        .ok_or_else(|| format!("No account with email '{}'", email))?,
                    (false, None) => return Err("Pass an email or --leave".into()),
                };
                let change = fridges.remove_member(&session, &fridge.fridge_id, &target_id)?;
                if change.left_self {
                    println!("✓ You left '{}'", fridge.name);
                } else {
                    println!("✓ Member removed from '{}'", fridge.name);
                }
            }

            FridgeSubcommand::Delete { fridge, force } => {
                let fridge = resolve_fridge(household, &session, fridge)?;
                if !force {
                    println!(
                        "This deletes '{}' and every ingredient in it. Run again with --force to confirm.",
                        fridge.name
                    );
                    return Ok(());
                }
                fridges.delete_fridge(&session, &fridge.fridge_id)?;
                println!("✓ Deleted '{}'", fridge.name);
            }

            FridgeSubcommand::Reorder { fridges: keys } => {
                let ids = keys
                    .iter()
                    .map(|key| resolve_fridge(household, &session, key).map(|f| f.fridge_id))
                    .collect::<Result<Vec<_>, _>>()?;
                let present: Vec<String> = fridges
                    .list_for_user(&session)?
                    .into_iter()
                    .map(|f| f.fridge_id)
                    .collect();

                // Fridges not named keep their relative place at the end.
                let full = reconcile(&ids, &present);

                let mut coordinator =
                    household.order_coordinator(order_sink(config), config.sync.debounce());
                let order = coordinator.reorder(&session, full)?;
                coordinator.flush_now();

                println!("✓ Saved order of {} fridge(s)", order.fridge_ids.len());
            }

            FridgeSubcommand::Compartment { command } => {
                self.compartment(household, &session, command)?;
            }
        }
        Ok(())
    }

    fn list(&self, household: &Household, session: &Session) -> CommandResult {
        let fridges = household.fridges.list_for_user(session)?;
        if fridges.is_empty() {
            println!("No fridges yet. Create one with 'fridge fridges create <name>'.");
            return Ok(());
        }

        let present: Vec<String> = fridges.iter().map(|f| f.fridge_id.clone()).collect();
        let order = household
            .order_coordinator(NoopSink, Default::default())
            .load(session, &present)?;

        let user_id = session.require_user()?;
        for id in &order.fridge_ids {
            if let Some(fridge) = fridges.iter().find(|f| &f.fridge_id == id) {
                let role = if fridge.is_owner(user_id) { "owner" } else { "member" };
                println!("{} ({})", fridge, role);
                println!("  id: {}", fridge.fridge_id);
            }
        }
        Ok(())
    }

    fn update(
        &self,
        household: &Household,
        session: &Session,
        key: &str,
        update: FridgeUpdate,
    ) -> CommandResult {
        let fridge = resolve_fridge(household, session, key)?;
        let updated = household
            .fridges
            .apply_update(session, &fridge.fridge_id, update)?;
        println!("✓ Updated {}", updated);
        Ok(())
    }

    fn compartment(
        &self,
        household: &Household,
        session: &Session,
        command: &CompartmentSubcommand,
    ) -> CommandResult {
        let (key, update) = match command {
            CompartmentSubcommand::Add {
                fridge,
                name,
                compartment_type,
            } => (
                fridge,
                FridgeUpdate::AddCompartment {
                    name: name.clone(),
                    compartment_type: *compartment_type,
                },
            ),
            CompartmentSubcommand::Rename {
                fridge,
                compartment,
                name,
            } => {
                let found = resolve_fridge(household, session, fridge)?;
                (
                    fridge,
                    FridgeUpdate::RenameCompartment {
                        compartment_id: resolve_compartment(&found, Some(compartment.as_str()))?,
                        name: name.clone(),
                    },
                )
            }
            CompartmentSubcommand::Remove {
                fridge,
                compartment,
            } => {
                let found = resolve_fridge(household, session, fridge)?;
                (
                    fridge,
                    FridgeUpdate::RemoveCompartment {
                        compartment_id: resolve_compartment(&found, Some(compartment.as_str()))?,
                    },
                )
            }
        };
        self.update(household, session, key, update)
    }
}

fn print_fridge(household: &Household, session: &Session, fridge: &Fridge) -> CommandResult {
    println!("{}", fridge);
    println!("  id: {}", fridge.fridge_id);
    if !fridge.memo.is_empty() {
        println!("  memo: {}", fridge.memo);
    }

    println!();
    println!("Compartments:");
    for compartment in &fridge.compartments {
        let count = household
            .ingredients
            .list_for_compartment(session, &fridge.fridge_id, &compartment.compartment_id)?
            .iter()
            .filter(|i| i.is_active())
            .count();
        println!(
            "  {} [{}] {} item(s)",
            compartment.name, compartment.compartment_type, count
        );
    }

    println!();
    println!("Members:");
    for member in &fridge.members {
        let marker = if member.role == Role::Owner { " (owner)" } else { "" };
        println!("  {}{}", member.nickname, marker);
    }
    Ok(())
}

/// The remote sink from config, or a no-op when no URL is set.
fn order_sink(config: &Config) -> Arc<dyn OrderSink> {
    match HttpOrderSink::from_config(config.sync.remote_url.as_deref(), config.sync.api_key.as_deref()) {
        Ok(sink) => Arc::new(sink),
        Err(e) => {
            tracing::debug!(error = %e, "Remote order sync disabled");
            Arc::new(NoopSink)
        }
    }
}
