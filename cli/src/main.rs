use std::io::{Error, ErrorKind};

use clap::{Parser, Subcommand};
use edtech::error::AppResult;
use edtech::model::entity::{Course, CourseCreate, Module, ModuleCreate, User, UserCreate};
use edtech::model::{CrudRepository, DatabaseError, DbConnection, ModelManager};
use edtech::web::{AuthenticatedUser, UserRole, validate};

#[derive(Parser, Debug)]
#[command(about = "CLI tool for seeding the edtech database", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserCommands,
    },

    /// Manage courses
    Course {
        #[command(subcommand)]
        action: CourseCommands,
    },

    /// Manage modules
    Module {
        #[command(subcommand)]
        action: ModuleCommands,
    },
}

/// User management
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    Add {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        full_name: String,
        /// student, instructor or admin
        #[arg(long, default_value = "student")]
        role: String,
    },
    ResetPassword {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

/// Course management
#[derive(Subcommand, Debug)]
pub enum CourseCommands {
    Add {
        /// Email of the owning instructor
        #[arg(long)]
        instructor: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// Leave out for a free course
        #[arg(long)]
        price: Option<f64>,
        #[arg(long, default_value_t = false)]
        publish: bool,
    },
}

/// Module management
#[derive(Subcommand, Debug)]
pub enum ModuleCommands {
    Add {
        /// Course title to attach the module to
        #[arg(long)]
        course_title: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, default_value_t = 0)]
        order_index: i32,
    },
}

fn invalid_input(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidInput, message.into())
}

async fn user_by_email(mm: &ModelManager, actor: &AuthenticatedUser, email: &str) -> AppResult<User> {
    let user = User::find_by_email(mm, actor, &email.trim().to_lowercase())
        .await?
        .ok_or_else(|| invalid_input(format!("no user with email {email}")))?;
    Ok(user)
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| Error::new(ErrorKind::NotFound, "DATABASE_URL is not set"))?;
    let db_con = DbConnection::connect(&database_url)?;
    let mm = ModelManager::new(db_con);
    let actor = AuthenticatedUser::admin();

    match args.command {
        Commands::User { action } => match action {
            UserCommands::Add {
                email,
                password,
                full_name,
                role,
            } => {
                if !validate::is_valid_email(&email) {
                    return Err(invalid_input("email is not valid").into());
                }
                if password.chars().count() < validate::MIN_PASSWORD_LEN {
                    return Err(invalid_input("password is too short").into());
                }

                let user = User::create(
                    &mm,
                    &actor,
                    UserCreate {
                        email: email.trim().to_lowercase(),
                        password_hash: edtech::auth::hash_password(&password)?,
                        full_name,
                        role: UserRole::from(role.as_str()),
                        phone: None,
                    },
                )
                .await?;
                println!("User created: {:?}", user);
            }

            UserCommands::ResetPassword { email, password } => {
                let user = user_by_email(&mm, &actor, &email).await?;
                let hash = edtech::auth::hash_password(&password)?;
                let user = user.set_password_hash(&mm, hash).await?;
                println!("Password reset for {}", user.email());
            }
        },

        Commands::Course { action } => match action {
            CourseCommands::Add {
                instructor,
                title,
                description,
                price,
                publish,
            } => {
                let owner = user_by_email(&mm, &actor, &instructor).await?;
                if owner.role() == UserRole::Student {
                    return Err(invalid_input("course owner must be an instructor or admin").into());
                }

                let owner = AuthenticatedUser::new(owner.id(), owner.role());
                let course = Course::create(
                    &mm,
                    &owner,
                    CourseCreate {
                        title,
                        description,
                        price,
                        is_free: Some(price.is_none_or(|p| p <= 0.0)),
                        is_published: Some(publish),
                        ..Default::default()
                    },
                )
                .await?;
                println!("Course created: {:?}", course);
            }
        },

        Commands::Module { action } => match action {
            ModuleCommands::Add {
                course_title,
                title,
                description,
                order_index,
            } => {
                let course_id: uuid::Uuid =
                    sqlx::query_scalar("SELECT id FROM courses WHERE title = $1")
                        .bind(&course_title)
                        .fetch_one(mm.executor())
                        .await
                        .map_err(DatabaseError::SqlxError)?;

                let module = Module::create(
                    &mm,
                    &actor,
                    ModuleCreate {
                        course_id,
                        title,
                        description,
                        order_index: Some(order_index),
                    },
                )
                .await?;
                println!("Module created: {:?}", module);
            }
        },
    }

    Ok(())
}
