use std::sync::Arc;

use assignmentpro::{
    config::Settings,
    domain::{
        default_departments, CreateAdminRequest, CreateDepartmentRequest, CreateMakerRequest,
        MakerApprovalUpdate,
    },
    service::ServiceContext,
    storage::LocalFileStore,
};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "seed", about = "Seed an AssignmentPro database")]
struct Cli {
    /// Overrides the configured database URL. Falls back to `DATABASE_URL`.
    #[arg(long)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the default department catalog.
    Departments,
    /// Create an admin account.
    Admin {
        #[arg(long, default_value = "admin@assignmentpro.com")]
        email: String,
        #[arg(long, default_value = "admin123")]
        password: String,
        #[arg(long, default_value = "System Administrator")]
        name: String,
    },
    /// Create one approved, paid maker per department.
    SampleMakers {
        #[arg(long, default_value = "maker123")]
        password: String,
    },
    /// Departments, the default admin and sample makers.
    All,
}

const SAMPLE_MAKERS: &[(&str, &str, &str, &str, &str)] = &[
    ("john.cs@example.com", "John Smith", "+251911234567", "johnsmith_cs", "Computer Science"),
    ("sarah.math@example.com", "Sarah Johnson", "+251922345678", "sarah_math", "Mathematics"),
    ("mike.physics@example.com", "Michael Brown", "+251933456789", "mike_physics", "Physics"),
    ("emma.chem@example.com", "Emma Wilson", "+251944567890", "emma_chem", "Chemistry"),
    ("david.bio@example.com", "David Lee", "+251955678901", "david_bio", "Biology"),
];

async fn seed_departments(ctx: &ServiceContext) -> anyhow::Result<()> {
    println!("Creating departments...");
    for (name, description, fee) in default_departments() {
        if ctx.department_repo.find_by_name(name).await?.is_some() {
            println!("  {} already exists", name);
            continue;
        }
        ctx.department_service
            .create(CreateDepartmentRequest {
                name: name.to_string(),
                description: Some(description.to_string()),
                service_fee: fee,
            })
            .await?;
        println!("  {} (fee {})", name, fee);
    }
    Ok(())
}

async fn seed_admin(ctx: &ServiceContext, email: String, password: String, name: String) -> anyhow::Result<()> {
    println!("Creating admin...");
    if ctx.admin_repo.find_by_email(&email).await?.is_some() {
        println!("  {} already exists", email);
        return Ok(());
    }
    ctx.identity_service
        .create_admin(CreateAdminRequest {
            email: email.clone(),
            password,
            name: Some(name),
        })
        .await?;
    println!("  {}", email);
    Ok(())
}

async fn seed_makers(ctx: &ServiceContext, password: &str) -> anyhow::Result<()> {
    println!("Creating sample makers...");
    for (email, name, phone, telegram, department) in SAMPLE_MAKERS {
        if ctx.maker_repo.find_by_email(email).await?.is_some() {
            println!("  {} already exists", email);
            continue;
        }
        let Some(department) = ctx.department_repo.find_by_name(department).await? else {
            println!("  skipping {}: department {} missing, run `seed departments`", email, department);
            continue;
        };

        let maker = ctx
            .identity_service
            .register_maker(
                CreateMakerRequest {
                    email: email.to_string(),
                    password: password.to_string(),
                    name: name.to_string(),
                    phone: phone.to_string(),
                    telegram_username: Some(telegram.to_string()),
                    whatsapp_number: Some(phone.to_string()),
                    department_id: department.id,
                },
                None,
            )
            .await?;

        ctx.maker_service
            .update_approval(
                maker.id,
                MakerApprovalUpdate {
                    is_approved: Some(true),
                    payment_approved: Some(true),
                },
            )
            .await?;
        println!("  {} ({})", email, department.name);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut settings = Settings::new().unwrap_or_default();
    if let Some(url) = cli
        .database_url
        .or_else(|| std::env::var("DATABASE_URL").ok())
    {
        settings.database.url = url;
    }

    println!("Seeding {}", settings.database.url);
    let db_pool = assignmentpro::init_database(&settings.database).await?;
    let file_store = Arc::new(LocalFileStore::new(&settings.uploads));
    let ctx = ServiceContext::new(db_pool, file_store, &settings);

    match cli.command {
        Command::Departments => seed_departments(&ctx).await?,
        Command::Admin { email, password, name } => seed_admin(&ctx, email, password, name).await?,
        Command::SampleMakers { password } => seed_makers(&ctx, &password).await?,
        Command::All => {
            seed_departments(&ctx).await?;
            seed_admin(
                &ctx,
                "admin@assignmentpro.com".to_string(),
                "admin123".to_string(),
                "System Administrator".to_string(),
            )
            .await?;
            seed_makers(&ctx, "maker123").await?;
        }
    }

    println!("Done.");
    Ok(())
}
