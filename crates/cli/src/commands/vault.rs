use crate::context::TpenContext;
use clap::Subcommand;
use tpen_core::{Error, Result};

#[derive(Subcommand, Debug)]
pub enum VaultCommands {
    /// Fetch a resource through the cache and print it
    Get {
        uri: String,

        /// Resource type, e.g. manifest, canvas, annotationpage
        #[arg(long, default_value = "manifest")]
        kind: String,

        /// Fetch again even when the resource is cached
        #[arg(long)]
        force: bool,

        /// Manifest expected to embed the resource
        #[arg(long, value_name = "URI")]
        manifest: Option<String>,

        /// Print cache counters after the fetch
        #[arg(long)]
        stats: bool,
    },
}

impl VaultCommands {
    pub async fn execute(self, ctx: &TpenContext) -> Result<()> {
        match self {
            VaultCommands::Get {
                uri,
                kind,
                force,
                manifest,
                stats,
            } => {
                let vault = ctx.vault();
                if let Some(manifest) = manifest {
                    vault.register_manifest_hint(&uri, &manifest);
                }

                let resource = vault
                    .get(&uri, kind.as_str(), force, Some("cli"))
                    .await
                    .ok_or_else(|| Error::network(uri.clone(), "resource unavailable"))?;
                println!("{}", serde_json::to_string_pretty(resource.as_ref())?);

                if stats {
                    eprintln!("{}", serde_json::to_string_pretty(&vault.stats())?);
                }
                Ok(())
            }
        }
    }
}
