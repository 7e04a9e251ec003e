//! Operator CLI for role bootstrapping and permission inspection.
//!
//! ```bash
//! DATABASE_URL=postgres://... potluck-admin init-roles
//! DATABASE_URL=postgres://... potluck-admin assign-role --email a@b.io --role admin
//! ```

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use sea_orm::Database;

use potluck_api::infra::db::{DbRoleRepository, DbUserRepository};
use potluck_api::usecase::role::{InitializeDefaultRolesUseCase, ListRolesUseCase, list_templates};
use potluck_api::usecase::user::{CreateUserInput, CreateUserUseCase};
use potluck_api::usecase::user_permission::{
    AssignRoleUseCase, GetUserPermissionsUseCase, RoleAssignment,
};
use potluck_domain::scope::SCOPE_CATALOG;

#[derive(Parser)]
#[command(name = "potluck-admin", about = "Manage Potluck roles and permissions")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create or refresh every predefined role template
    InitRoles,
    /// Print stored roles with their scopes
    ListRoles,
    /// Print the scope catalog
    ListScopes,
    /// Give a user a role
    AssignRole {
        #[arg(long)]
        email: String,
        #[arg(long)]
        role: String,
    },
    /// Print a user's roles, custom scopes and effective scopes
    ShowUserPermissions {
        #[arg(long)]
        email: String,
    },
    /// Create an account that bypasses scope checks
    CreateSuperuser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        full_name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    potluck_core::tracing::init_tracing("warn");
    let args = Args::parse();

    match args.command {
        Command::ListScopes => {
            for scope in SCOPE_CATALOG {
                println!("{scope}");
            }
        }
        Command::InitRoles => {
            let (_, roles) = connect().await?;
            let written = InitializeDefaultRolesUseCase { roles }.execute().await?;
            for (template, write) in list_templates().iter().zip(&written) {
                println!(
                    "{:<16} {} scopes, {} sessions invalidated",
                    template.key,
                    write.role.scopes.len(),
                    write.bumped_users
                );
            }
        }
        Command::ListRoles => {
            let (_, roles) = connect().await?;
            for role in (ListRolesUseCase { roles }).execute().await? {
                println!("{} ({})", role.name, role.id);
                if let Some(description) = &role.description {
                    println!("  {description}");
                }
                for scope in &role.scopes {
                    println!("  - {scope}");
                }
            }
        }
        Command::AssignRole { email, role } => {
            let (users, roles) = connect().await?;
            let changed = AssignRoleUseCase { users, roles }
                .execute(RoleAssignment {
                    user_email: email.clone(),
                    role_name: role.clone(),
                })
                .await?;
            if changed {
                println!("assigned '{role}' to {email}");
            } else {
                println!("{email} already has '{role}'");
            }
        }
        Command::ShowUserPermissions { email } => {
            let (users, _) = connect().await?;
            let permissions = GetUserPermissionsUseCase { users }.execute(&email).await?;
            let user = &permissions.user;
            println!("{} ({})", user.email, user.id);
            println!("superuser: {}", user.is_superuser);
            println!("roles:");
            for role in &user.roles {
                println!("  - {}", role.name);
            }
            println!("custom scopes:");
            for scope in &user.custom_scopes {
                println!("  - {scope}");
            }
            println!("effective scopes:");
            for scope in &permissions.effective_scopes {
                println!("  - {scope}");
            }
        }
        Command::CreateSuperuser {
            email,
            password,
            full_name,
        } => {
            let (users, _) = connect().await?;
            let user = CreateUserUseCase { users }
                .execute(CreateUserInput {
                    email,
                    password,
                    full_name,
                    is_superuser: true,
                })
                .await?;
            println!("created superuser {} ({})", user.email, user.id);
        }
    }
    Ok(())
}

async fn connect() -> Result<(DbUserRepository, DbRoleRepository)> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
    let db = Database::connect(&database_url)
        .await
        .context("connect to database")?;
    Ok((DbUserRepository { db: db.clone() }, DbRoleRepository { db }))
}
