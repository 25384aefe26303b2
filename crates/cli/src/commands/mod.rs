use crate::context::TpenContext;
use clap::Subcommand;
use tpen_core::Result;

pub mod auth;
pub mod permission;
pub mod project;
pub mod token;
pub mod vault;

use self::auth::AuthCommands;
use self::permission::PermissionCommands;
use self::project::ProjectCommands;
use self::token::TokenCommands;
use self::vault::VaultCommands;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect, store or clear the stored credential
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },

    /// Accept the identity provider's redirect URL and store its credential
    Login {
        /// Redirect URL carrying an `idToken` query parameter
        #[arg(long, value_name = "URL")]
        redirect: String,
    },

    /// Authentication state
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },

    /// Evaluate permissions against a project
    #[command(visible_alias = "perm")]
    Permission {
        #[command(subcommand)]
        command: PermissionCommands,
    },

    /// Fetch resources through the resource cache
    Vault {
        #[command(subcommand)]
        command: VaultCommands,
    },

    /// Load projects from the services API
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },
}

impl Commands {
    pub async fn execute(self, ctx: &TpenContext) -> Result<()> {
        match self {
            Commands::Token { command } => command.execute(ctx),
            Commands::Login { redirect } => token::login(ctx, &redirect),
            Commands::Auth { command } => command.execute(ctx).await,
            Commands::Permission { command } => command.execute(ctx).await,
            Commands::Vault { command } => command.execute(ctx).await,
            Commands::Project { command } => command.execute(ctx).await,
        }
    }
}
