//! Ingredient commands.

use chrono::{Duration, NaiveDate};
use clap::{Args, Subcommand};

use fridgekeep_core::{Clock, Household, Ingredient, IngredientUpdate, NewIngredient};

use super::{require_session, resolve_compartment, resolve_fridge, CommandResult};

/// Track what's in your fridges
#[derive(Args)]
pub struct IngredientCommand {
    #[command(subcommand)]
    pub command: IngredientSubcommand,
}

/// Expiration given as a date or as days from today.
#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct ExpiresArg {
    /// Expiration date (YYYY-MM-DD)
    #[arg(long)]
    expires: Option<NaiveDate>,
    /// Days from today until expiration
    #[arg(long)]
    days: Option<i64>,
}

impl ExpiresArg {
    fn resolve(&self, clock: &dyn Clock) -> Option<NaiveDate> {
        self.expires
            .or_else(|| self.days.map(|d| clock.now().date_naive() + Duration::days(d)))
    }
}

/// Accepts finite, non-negative amounts only.
fn parse_quantity(s: &str) -> Result<f64, String> {
    let quantity: f64 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    if !quantity.is_finite() || quantity < 0.0 {
        return Err(format!("'{}' is not a valid quantity", s));
    }
    Ok(quantity)
}

#[derive(Subcommand)]
pub enum IngredientSubcommand {
    /// Add an ingredient to a fridge
    Add {
        fridge: String,
        name: String,
        #[command(flatten)]
        expires: ExpiresArg,
        /// Compartment id or name (default: first compartment)
        #[arg(long)]
        compartment: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, short, default_value = "1", value_parser = parse_quantity)]
        quantity: f64,
        #[arg(long, short)]
        unit: Option<String>,
        #[arg(long)]
        memo: Option<String>,
    },
    /// List a fridge's ingredients
    List {
        fridge: String,
        /// Only this compartment
        #[arg(long)]
        compartment: Option<String>,
        /// Include consumed and disposed ingredients
        #[arg(long, short)]
        all: bool,
    },
    /// Show one ingredient
    Show { id: String },
    /// Edit an ingredient
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, value_parser = parse_quantity)]
        quantity: Option<f64>,
        #[arg(long)]
        unit: Option<String>,
        #[arg(long)]
        expires: Option<NaiveDate>,
        #[arg(long)]
        memo: Option<String>,
    },
    /// Move to another compartment of the same fridge
    Move { id: String, compartment: String },
    /// Mark as used up
    Consume { id: String },
    /// Mark as thrown away
    Dispose { id: String },
    /// Remove the record without counting it
    Delete { id: String },
    /// Count active ingredients per category
    Summary { fridge: String },
    /// Ingredients expiring soon across all your fridges
    Expiring {
        #[arg(long, short, default_value = "3")]
        days: i64,
        /// Also push a notification
        #[arg(long)]
        notify: bool,
    },
}

impl IngredientCommand {
    pub fn run(&self, household: &Household) -> CommandResult {
        let session = require_session(household)?;
        let ingredients = &household.ingredients;

        match &self.command {
            IngredientSubcommand::Add {
                fridge,
                name,
                expires,
                compartment,
                category,
                quantity,
                unit,
                memo,
            } => {
                let fridge = resolve_fridge(household, &session, fridge)?;
                let compartment_id = resolve_compartment(&fridge, compartment.as_deref())?;
                let expiration = expires
                    .resolve(household.clock().as_ref())
                    .ok_or("Pass --expires or --days")?;

                let mut input =
                    NewIngredient::new(name, expiration)
                    .with_quantity(*quantity, unit.clone().unwrap_or_default());
                if let Some(category) = category {
                    input = input.with_category(category);
                }
                if let Some(memo) = memo {
                    input = input.with_memo(memo);
                }

                let ingredient = ingredients.add(&session, &fridge.fridge_id, &compartment_id, input)?;
                println!("✓ Added {}", ingredient);
                println!("  id: {}", ingredient.ingredient_id);
            }

            IngredientSubcommand::List {
                fridge,
                compartment,
                all,
            } => {
                let fridge = resolve_fridge(household, &session, fridge)?;
                let list = match compartment {
                    Some(key) => {
                        let compartment_id = resolve_compartment(&fridge, Some(key.as_str()))?;
                        ingredients.list_for_compartment(&session, &fridge.fridge_id, &compartment_id)?
                    }
                    None => ingredients.list_for_fridge(&session, &fridge.fridge_id)?,
                };
                let list: Vec<Ingredient> = list.into_iter().filter(|i| *all || i.is_active()).collect();
                print_list(&list);
            }

            IngredientSubcommand::Show { id } => {
                let ingredient = ingredients.get(&session, id)?;
                let days = ingredient.days_until_expiry(household.clock().now());
                println!("{}", ingredient);
                println!("  id: {}", ingredient.ingredient_id);
                if !ingredient.category.is_empty() {
                    println!("  category: {}", ingredient.category);
                }
                if !ingredient.memo.is_empty() {
                    println!("  memo: {}", ingredient.memo);
                }
                if ingredient.is_active() {
                    println!("  days left: {}", days);
                }
            }

            IngredientSubcommand::Update {
                id,
                name,
                category,
                quantity,
                unit,
                expires,
                memo,
            } => {
                let update = IngredientUpdate {
                    name: name.clone(),
                    category: category.clone(),
                    quantity: *quantity,
                    unit: unit.clone(),
                    expiration_date: *expires,
                    memo: memo.clone(),
                };
                let ingredient = ingredients.update(&session, id, update)?;
                println!("✓ Updated {}", ingredient);
            }

            IngredientSubcommand::Move { id, compartment } => {
                let ingredient = ingredients.get(&session, id)?;
                let fridge = household.fridges.get(&session, &ingredient.fridge_id)?;
                let compartment_id = resolve_compartment(&fridge, Some(compartment.as_str()))?;
                let moved = ingredients.move_to_compartment(&session, id, &compartment_id)?;
                println!("✓ Moved {}", moved.name);
            }

            IngredientSubcommand::Consume { id } => {
                let ingredient = ingredients.consume(&session, id)?;
                println!("✓ Consumed {}", ingredient.name);
            }

            IngredientSubcommand::Dispose { id } => {
                let ingredient = ingredients.dispose(&session, id)?;
                println!("✓ Disposed {}", ingredient.name);
            }

            IngredientSubcommand::Delete { id } => {
                ingredients.delete(&session, id)?;
                println!("✓ Deleted");
            }

            IngredientSubcommand::Summary { fridge } => {
                let fridge = resolve_fridge(household, &session, fridge)?;
                let summary = ingredients.category_summary(&session, &fridge.fridge_id)?;
                if summary.is_empty() {
                    println!("No active ingredients in '{}'.", fridge.name);
                }
                for (category, count) in summary {
                    println!("{:<20} {:>4}", category, count);
                }
            }

            IngredientSubcommand::Expiring { days, notify } => {
                let list = ingredients.expiring_soon(&session, *days)?;
                print_list(&list);
                if *notify {
                    ingredients.notify_expiring(&session, *days)?;
                }
            }
        }
        Ok(())
    }
}

fn print_list(list: &[Ingredient]) {
    if list.is_empty() {
        println!("No ingredients.");
        return;
    }
    for ingredient in list {
        println!("{}", ingredient);
        println!("  id: {}", ingredient.ingredient_id);
    }
}
