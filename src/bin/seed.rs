use std::sync::Arc;

use campus_feed::{
    auth::AuthService,
    config::Settings,
    domain::{CreateFeedItemRequest, Role, RoleContext},
    repository::{SqliteModuleRepository, SqliteUserRepository},
    service::FeedCreationService,
    uploads::LocalUploader,
};
use chrono::{Duration, Utc};
use clap::Parser;
use fake::{
    faker::lorem::en::{Sentence, Words},
    Fake,
};

#[derive(Parser, Debug)]
#[command(about = "Seed the campus feed database with demo users, modules and posts")]
struct Args {
    /// Database URL (defaults to the configured one)
    #[arg(long)]
    database_url: Option<String>,

    /// Number of students to create
    #[arg(long, default_value_t = 6)]
    students: usize,

    /// Posts per lecturer
    #[arg(long, default_value_t = 3)]
    posts: usize,
}

const MODULES: &[(&str, &str)] = &[
    ("CS101", "Introduction to Programming"),
    ("MA201", "Linear Algebra"),
    ("PH110", "Mechanics"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let settings = Settings::new().unwrap_or_default();
    let database_url = args.database_url.unwrap_or(settings.database.url.clone());

    println!("🌱 Seeding {}", database_url);
    let db_pool = campus_feed::connect_database(&database_url, 5).await?;

    let users = SqliteUserRepository::new(db_pool.clone());
    let modules = SqliteModuleRepository::new(db_pool.clone());
    let auth = AuthService::new(db_pool.clone());

    println!("📚 Creating modules...");
    let mut module_ids = Vec::new();
    for (code, name) in MODULES {
        module_ids.push(modules.create(code, name).await?.id);
    }

    println!("👥 Creating users...");
    let term_start = (Utc::now() - Duration::days(30)).date_naive();
    let mut sessions = Vec::new();

    let admin = users.create_user("admin", None).await?;
    users.add_role(admin, Role::Admin).await?;
    sessions.push(("admin".to_string(), admin));

    let coordinator = users.create_user("coordinator", None).await?;
    users.add_role(coordinator, Role::Coordinator).await?;
    for module_id in &module_ids {
        users.assign_module(coordinator, *module_id, RoleContext::Coordinator).await?;
    }
    sessions.push(("coordinator".to_string(), coordinator));

    let mut lecturers = Vec::new();
    for (index, module_id) in module_ids.iter().enumerate() {
        let name = format!("lecturer{}", index + 1);
        let id = users.create_user(&name, Some(term_start)).await?;
        users.add_role(id, Role::Lecturer).await?;
        users.assign_module(id, *module_id, RoleContext::Lecturer).await?;
        lecturers.push((name.clone(), *module_id));
        sessions.push((name, id));
    }

    for index in 0..args.students {
        let name = format!("student{}", index + 1);
        let id = users.create_user(&name, Some(term_start)).await?;
        users.add_role(id, Role::Student).await?;
        // Every student takes the first module plus one more.
        users.assign_module(id, module_ids[0], RoleContext::Student).await?;
        let extra = module_ids[1 + index % (module_ids.len() - 1)];
        users.assign_module(id, extra, RoleContext::Student).await?;
        sessions.push((name, id));
    }

    println!("📣 Posting feed items...");
    let uploader = Arc::new(LocalUploader::new(
        settings.server.uploads_dir.clone(),
        settings.feed.max_attachment_bytes,
    ));
    let context = campus_feed::service::ServiceContext::new(db_pool.clone(), uploader, &settings.feed);
    let creation: &FeedCreationService = &context.feed_creation_service;

    creation
        .create(
            CreateFeedItemRequest {
                kind: "System".to_string(),
                title: "Portal maintenance".to_string(),
                message: "The portal will be offline on Sunday from 02:00 to 04:00.".to_string(),
                audience: Some("All".to_string()),
                ..Default::default()
            },
            "admin",
        )
        .await?;

    creation
        .create(
            CreateFeedItemRequest {
                kind: "General".to_string(),
                title: "Staff meeting".to_string(),
                message: "Faculty meeting on Friday in the main hall.".to_string(),
                audience: Some("Staff".to_string()),
                ..Default::default()
            },
            "coordinator",
        )
        .await?;

    for (lecturer, module_id) in &lecturers {
        for post in 0..args.posts {
            let kind = if post % 2 == 0 { "General" } else { "DocumentUpload" };
            let words: Vec<String> = Words(2..4).fake();
            creation
                .create(
                    CreateFeedItemRequest {
                        kind: kind.to_string(),
                        title: words.join(" "),
                        message: Sentence(6..12).fake(),
                        module_id: Some(*module_id),
                        ..Default::default()
                    },
                    lecturer,
                )
                .await?;
        }
    }

    println!("🔑 Issuing sessions...");
    for (name, id) in sessions {
        let token = auth
            .create_session(id, settings.auth.session_duration_hours)
            .await?;
        println!("   {:<14} {}", name, token);
    }

    println!("✅ Done");
    Ok(())
}
