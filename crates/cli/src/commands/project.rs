use crate::context::TpenContext;
use clap::Subcommand;
use tpen_core::Result;

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// Load a project and print it
    Load {
        id: String,

        /// Only print the label and the collaborators' roles
        #[arg(long)]
        summary: bool,
    },
}

impl ProjectCommands {
    pub async fn execute(self, ctx: &TpenContext) -> Result<()> {
        match self {
            ProjectCommands::Load { id, summary } => {
                let project = ctx.load_project(&id).await?;
                if !summary {
                    println!("{}", serde_json::to_string_pretty(project.as_ref())?);
                    return Ok(());
                }

                println!("{}", project.display_label());
                for (user_id, member) in &project.collaborators {
                    println!(
                        "  {:<24} {}",
                        member.display_name().unwrap_or(user_id.as_str()),
                        member.roles.join(", ")
                    );
                }
                Ok(())
            }
        }
    }
}
