//! Account and session commands.
//!
//! Passwords are never taken as arguments. They come from `FRIDGE_PASSWORD`
//! when set, otherwise from a prompt on stdin.

use std::error::Error;
use std::io::{self, BufRead, Write};

use clap::{Args, Subcommand};

use fridgekeep_core::{Household, NewAccount, ProfileUpdate};

use super::{require_session, CommandResult};

const PASSWORD_ENV: &str = "FRIDGE_PASSWORD";

/// Register, sign in and manage your account
#[derive(Args)]
pub struct AccountCommand {
    #[command(subcommand)]
    pub command: AccountSubcommand,
}

#[derive(Subcommand)]
pub enum AccountSubcommand {
    /// Create an account and sign in
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        nickname: String,
        /// Profile image URL
        #[arg(long)]
        image: Option<String>,
    },
    /// Sign in on this device
    Login {
        #[arg(long)]
        email: String,
    },
    /// Sign out of this device
    Logout {
        /// Also erase every local collection
        #[arg(long)]
        wipe: bool,
    },
    /// Show the signed-in account
    Whoami,
    /// Change nickname, profile image or password
    Update {
        #[arg(long)]
        nickname: Option<String>,
        #[arg(long)]
        image: Option<String>,
        /// Prompt for a new password
        #[arg(long)]
        password: bool,
    },
    /// Delete your account, your fridges and their contents
    Delete {
        /// Skip confirmation
        #[arg(long, short)]
        force: bool,
    },
}

impl AccountCommand {
    pub fn run(&self, household: &Household) -> CommandResult {
        match &self.command {
            AccountSubcommand::Register {
                email,
                nickname,
                image,
            } => {
                let password = read_password("Password")?;
                let mut input = NewAccount::new(email, password, nickname);
                if let Some(image) = image {
                    input = input.with_profile_image(image);
                }
                let account = household.accounts.register(input)?;
                household.sessions.login(&account)?;

                println!("✓ Registered and signed in as {}", account.nickname);
                println!();
                println!("Create your first fridge with:");
                println!("  fridge fridges create \"Kitchen\"");
                Ok(())
            }

            AccountSubcommand::Login { email } => {
                let password = read_password("Password")?;
                let account = household
                    .accounts
                    .authenticate(email, &password)
                    .ok_or("Invalid email or password")?;
                household.sessions.login(&account)?;
                println!("✓ Signed in as {}", account.nickname);
                Ok(())
            }

            AccountSubcommand::Logout { wipe } => {
                if *wipe {
                    let removed = household.sessions.logout_and_wipe()?;
                    println!("✓ Signed out and removed {} local collection(s)", removed);
                } else {
                    household.sessions.logout()?;
                    println!("✓ Signed out");
                }
                Ok(())
            }

            AccountSubcommand::Whoami => {
                let session = household.sessions.restore();
                match household.accounts.current_account(&session) {
                    Some(account) => println!("{}", account),
                    None => println!("Not signed in."),
                }
                Ok(())
            }

            AccountSubcommand::Update {
                nickname,
                image,
                password,
            } => {
                let session = require_session(household)?;
                let mut update = ProfileUpdate::new();
                if let Some(nickname) = nickname {
                    update = update.nickname(nickname);
                }
                if let Some(image) = image {
                    update = update.profile_image(image);
                }
                if *password {
                    update = update.password(read_password("New password")?);
                }
                if update.is_empty() {
                    println!("Nothing to update. Pass --nickname, --image or --password.");
                    return Ok(());
                }

                let user_id = session.require_user()?;
                if !household.accounts.update_profile(&session, user_id, update)? {
                    return Err("The signed-in account no longer exists".into());
                }
                println!("✓ Profile updated");
                Ok(())
            }

            AccountSubcommand::Delete { force } => {
                let session = require_session(household)?;
                if !force {
                    println!("This deletes your account, every fridge you own and their ingredients.");
                    println!("Run again with --force to confirm.");
                    return Ok(());
                }
                let user_id = session.require_user()?;
                household.accounts.delete_account(&session, user_id)?;
                println!("✓ Account deleted");
                Ok(())
            }
        }
    }
}

/// Reads a password from `FRIDGE_PASSWORD`, or prompts for one on stdin.
fn read_password(prompt: &str) -> Result<String, Box<dyn Error>> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return non_empty(password);
    }
    print!("{}: ", prompt);
    io::stdout().flush()?;
    read_password_line(&mut io::stdin().lock())
}

fn read_password_line(input: &mut impl BufRead) -> Result<String, Box<dyn Error>> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    non_empty(line.trim_end_matches(['\r', '\n']).to_string())
}

fn non_empty(password: String) -> Result<String, Box<dyn Error>> {
    if password.is_empty() {
        return Err("Password cannot be empty".into());
    }
    Ok(password)
}
