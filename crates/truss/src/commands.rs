mod load;

use std::process::ExitCode;

use anyhow::Result;
use clap::Subcommand;

use crate::args::GlobalArgs;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self, args: &GlobalArgs) -> Result<ExitCode>;
}

#[derive(Debug, Subcommand)]
pub enum TrussCommand {
    /// Load a solution into a workspace and report the result
    Load(self::load::Load),
}

impl Command for TrussCommand {
    async fn execute(&self, args: &GlobalArgs) -> Result<ExitCode> {
        match self {
            TrussCommand::Load(cmd) => cmd.execute(args).await,
        }
    }
}
