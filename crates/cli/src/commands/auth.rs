use crate::context::TpenContext;
use chrono::{DateTime, Utc};
use clap::Subcommand;
use tpen_core::Result;

#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Authenticate from the stored credential and report the session
    Status {
        /// Also load the user's profile from the services API
        #[arg(long)]
        profile: bool,
    },
}

impl AuthCommands {
    pub async fn execute(self, ctx: &TpenContext) -> Result<()> {
        match self {
            AuthCommands::Status { profile } => status(ctx, profile).await,
        }
    }
}

async fn status(ctx: &TpenContext, with_profile: bool) -> Result<()> {
    let Some(session) = ctx.session()? else {
        println!("Not authenticated");
        return Ok(());
    };

    println!("Authenticated");
    println!("  user:    {}", session.user_id.as_deref().unwrap_or("<unknown>"));
    println!("  agent:   {}", session.agent.as_deref().unwrap_or("<none>"));
    match session
        .expires_at_ms
        .and_then(DateTime::<Utc>::from_timestamp_millis)
    {
        Some(at) => println!("  expires: {}", at.to_rfc3339()),
        None => println!("  expires: <unknown>"),
    }

    if with_profile {
        let profile = ctx.load_profile().await?;
        println!(
            "  name:    {}",
            profile.display_name().unwrap_or("<no display name>")
        );
    }
    Ok(())
}
