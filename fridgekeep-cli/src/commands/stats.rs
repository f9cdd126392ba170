use clap::Args;

use fridgekeep_core::Household;

use super::{config_cmd::OutputFormat, require_session, CommandResult};

/// Show how much you've added, used and thrown away
#[derive(Args)]
pub struct StatsCommand {
    #[arg(long, short, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl StatsCommand {
    pub fn run(&self, household: &Household) -> CommandResult {
        let session = require_session(household)?;
        let stats = household.statistics.statistics(&session)?;
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
            OutputFormat::Text => println!("{}", stats),
        }
        Ok(())
    }
}
