use crate::context::TpenContext;
use chrono::{DateTime, Utc};
use clap::Subcommand;
use serde_json::json;
use tpen_core::{Error, Result};
use tpen_security::token;

#[derive(Subcommand, Debug)]
pub enum TokenCommands {
    /// Decode a credential's claims (the stored one when none is given)
    Inspect {
        token: Option<String>,
    },

    /// Store a credential
    Store {
        token: String,
    },

    /// Remove the stored credential
    Clear,
}

impl TokenCommands {
    pub fn execute(self, ctx: &TpenContext) -> Result<()> {
        match self {
            TokenCommands::Inspect { token } => inspect(ctx, token),
            TokenCommands::Store { token } => {
                ctx.authenticator().store_token(&token)?;
                println!("Credential stored");
                Ok(())
            }
            TokenCommands::Clear => {
                if ctx.authenticator().logout()? {
                    println!("Credential removed");
                } else {
                    println!("No credential stored");
                }
                Ok(())
            }
        }
    }
}

fn inspect(ctx: &TpenContext, token: Option<String>) -> Result<()> {
    let token = match token {
        Some(token) => token,
        None => ctx
            .authenticator()
            .token()?
            .ok_or_else(|| Error::unauthenticated("no credential stored"))?,
    };

    let claims = token::decode_claims(Some(&token))?;
    let agent = claims.agent_iri(ctx.authenticator().agent_claim()).map(str::to_string);
    let user_id = agent.as_deref().and_then(token::user_id_from_agent);
    let expires_at = claims
        .exp()
        .and_then(|exp| DateTime::<Utc>::from_timestamp(exp as i64, 0))
        .map(|at| at.to_rfc3339());
    let expired = token::is_expired(&token).ok();

    let report = json!({
        "user_id": user_id,
        "agent": agent,
        "expires_at": expires_at,
        "expired": expired,
        "claims": claims,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub fn login(ctx: &TpenContext, redirect: &str) -> Result<()> {
    let Some(token) = ctx.authenticator().accept_redirect(redirect)? else {
        return Err(Error::unauthenticated("redirect URL carries no idToken parameter"));
    };
    match token::user_id_from_agent(
        &token::agent_iri_with_claim(&token, ctx.authenticator().agent_claim()).unwrap_or_default(),
    ) {
        Some(user_id) => println!("Logged in as {user_id}"),
        None => println!("Credential stored"),
    }
    Ok(())
}
