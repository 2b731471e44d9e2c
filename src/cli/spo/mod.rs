//! SharePoint Online commands

pub mod cdn;
pub mod list_view_field;
pub mod sitescript;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::cli::Context;

#[derive(Args, Debug)]
pub struct SpoArgs {
    #[command(subcommand)]
    pub command: SpoCommand,
}

#[derive(Subcommand, Debug)]
pub enum SpoCommand {
    /// Office 365 CDN settings and origins
    Cdn(cdn::CdnArgs),

    /// Site scripts
    Sitescript(sitescript::SitescriptArgs),

    /// Lists
    List(list_view_field::ListArgs),
}

pub async fn execute(ctx: &Context, args: SpoArgs) -> Result<()> {
    match args.command {
        SpoCommand::Cdn(args) => cdn::execute(ctx, args).await,
        SpoCommand::Sitescript(args) => sitescript::execute(ctx, args).await,
        SpoCommand::List(args) => list_view_field::execute(ctx, args).await,
    }
}
