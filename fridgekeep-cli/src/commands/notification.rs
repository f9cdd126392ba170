use clap::{Args, Subcommand};

use fridgekeep_core::Household;

use super::{require_session, CommandResult};

/// Read your notifications
#[derive(Args)]
pub struct NotificationCommand {
    #[command(subcommand)]
    pub command: NotificationSubcommand,
}

#[derive(Subcommand)]
pub enum NotificationSubcommand {
    /// List notifications, newest first
    List {
        /// Only unread ones
        #[arg(long, short)]
        unread: bool,
    },
    /// Mark one notification as read
    Read { id: String },
    /// Mark everything as read
    ReadAll,
}

impl NotificationCommand {
    pub fn run(&self, household: &Household) -> CommandResult {
        let session = require_session(household)?;
        let inbox = &household.notifications;

        match &self.command {
            NotificationSubcommand::List { unread } => {
                let notifications: Vec<_> = inbox
                    .list(&session)?
                    .into_iter()
                    .filter(|n| !unread || !n.is_read)
                    .collect();
                if notifications.is_empty() {
                    println!("No notifications.");
                    return Ok(());
                }
                for notification in &notifications {
                    println!("{}", notification);
                    println!("  id: {}", notification.notification_id);
                }
                println!();
                println!("{} unread", inbox.unread_count(&session)?);
            }
            NotificationSubcommand::Read { id } => {
                inbox.mark_read(&session, id)?;
                println!("✓ Marked as read");
            }
            NotificationSubcommand::ReadAll => {
                let count = inbox.mark_all_read(&session)?;
                println!("✓ Marked {} notification(s) as read", count);
            }
        }
        Ok(())
    }
}
