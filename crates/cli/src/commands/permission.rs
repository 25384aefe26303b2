use crate::context::TpenContext;
use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tpen_core::{Error, Project, Result, ResultExt};
use tpen_security::{Decision, MatchMode};

/// Where the project to evaluate against comes from
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct ProjectSource {
    /// Project JSON document on disk
    #[arg(long, value_name = "PATH")]
    pub project_file: Option<PathBuf>,

    /// Project id to load from the services API
    #[arg(long, value_name = "ID")]
    pub project: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum PermissionCommands {
    /// Decide whether a user holds a permission, e.g. UPDATE_*_LINE
    Check {
        permission: String,

        #[command(flatten)]
        source: ProjectSource,

        /// User id to evaluate; defaults to the authenticated user
        #[arg(long)]
        user: Option<String>,

        /// Stored ANY matches only a literal ANY
        #[arg(long)]
        minimum: bool,
    },

    /// Print every permission a user holds through their roles
    List {
        #[command(flatten)]
        source: ProjectSource,

        #[arg(long)]
        user: Option<String>,
    },
}

impl PermissionCommands {
    pub async fn execute(self, ctx: &TpenContext) -> Result<()> {
        match self {
            PermissionCommands::Check {
                permission,
                source,
                user,
                minimum,
            } => {
                let project = resolve_project(ctx, &source).await?;
                let user_id = resolve_user(ctx, user)?;
                let mode = if minimum {
                    MatchMode::Minimum
                } else {
                    MatchMode::Query
                };
                let decision = check(ctx, &permission, &project, &user_id, mode);
                println!("{}", report_line(&permission, &user_id, &decision));
                Ok(())
            }
            PermissionCommands::List { source, user } => {
                let project = resolve_project(ctx, &source).await?;
                let user_id = resolve_user(ctx, user)?;
                let granted = ctx.engine().user_permissions(&project, &user_id);
                if granted.is_empty() {
                    println!("No permissions for '{user_id}' in {}", project.display_label());
                }
                for permission in granted {
                    println!("{permission}");
                }
                Ok(())
            }
        }
    }
}

/// Evaluate `permission` for `user_id` against `project`
pub fn check(
    ctx: &TpenContext,
    permission: &str,
    project: &Project,
    user_id: &str,
    mode: MatchMode,
) -> Decision {
    ctx.engine().evaluate(permission, Some(project), user_id, mode)
}

/// One line per check; the decision's own text carries the verdict
pub fn report_line(permission: &str, user_id: &str, decision: &Decision) -> String {
    format!("{permission} for '{user_id}': {decision}")
}

/// Read a project document as the services API returns it
pub fn read_project_file(path: &Path) -> Result<Project> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::file_system(path, "read project", e))?;
    serde_json::from_str::<Project>(&content)
        .with_context(|| format!("invalid project document {}", path.display()))
}

async fn resolve_project(ctx: &TpenContext, source: &ProjectSource) -> Result<Arc<Project>> {
    match (&source.project_file, &source.project) {
        (Some(path), _) => Ok(Arc::new(read_project_file(path)?)),
        (None, Some(id)) => ctx.load_project(id).await,
        (None, None) => Err(Error::configuration(
            "either --project-file or --project is required",
        )),
    }
}

/// The explicit user, else the authenticated one, else nobody
fn resolve_user(ctx: &TpenContext, user: Option<String>) -> Result<String> {
    if let Some(user) = user {
        return Ok(user);
    }
    Ok(ctx
        .session()?
        .and_then(|session| session.user_id)
        .unwrap_or_default())
}
