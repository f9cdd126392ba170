mod account;
mod config_cmd;
mod fridge;
mod ingredient;
mod notification;
mod stats;

pub use account::AccountCommand;
pub use config_cmd::ConfigCommand;
pub use fridge::FridgeCommand;
pub use ingredient::IngredientCommand;
pub use notification::NotificationCommand;
pub use stats::StatsCommand;

use std::error::Error;

use fridgekeep_core::{Fridge, Household, Session};

pub type CommandResult = Result<(), Box<dyn Error>>;

/// The session saved on this device, or an error telling the user to log in.
pub fn require_session(household: &Household) -> Result<Session, Box<dyn Error>> {
    let session = household.sessions.restore();
    if !session.is_signed_in() {
        return Err("Not signed in. Run 'fridge account login' first.".into());
    }
    Ok(session)
}

/// Finds one of the user's fridges by id, or by name when unambiguous.
pub fn resolve_fridge(
    household: &Household,
    session: &Session,
    key: &str,
) -> Result<Fridge, Box<dyn Error>> {
    let fridges = household.fridges.list_for_user(session)?;
    if let Some(fridge) = fridges.iter().find(|f| f.fridge_id == key) {
        return Ok(fridge.clone());
    }

    let mut by_name = fridges.into_iter().filter(|f| f.name.eq_ignore_ascii_case(key));
    match (by_name.next(), by_name.next()) {
        (Some(fridge), None) => Ok(fridge),
        (Some(_), Some(_)) => Err(format!("More than one fridge is named '{}'. Use its id.", key).into()),
        (None, _) => Err(format!("Fridge not found: {}", key).into()),
    }
}

/// Finds a compartment id by id or name. `None` picks the first compartment.
pub fn resolve_compartment(fridge: &Fridge, key: Option<&str>) -> Result<String, Box<dyn Error>> {
    let found = match key {
        None => fridge.compartments.first(),
        Some(key) => fridge
            .compartments
            .iter()
            .find(|c| c.compartment_id == key || c.name.eq_ignore_ascii_case(key)),
    };
    found
        .map(|c| c.compartment_id.clone())
        .ok_or_else(|| match key {
            Some(key) => format!("Compartment not found in '{}': {}", fridge.name, key).into(),
            None => format!("Fridge '{}' has no compartments", fridge.name).into(),
        })
}
