//! DevCamper directory API
//!
//! Serves the bootcamp directory from an in-memory store.
//!
//! ```text
//! cargo run --example directory_api            # serve, seeding from `seed_dir` if configured
//! cargo run --example directory_api -- -i      # import the fixture files, then serve
//! ```
//!
//! The configuration is read from `DEVCAMPER_CONFIG`, falling back to
//! `demos/directory_api/config.yaml`. Log levels follow `RUST_LOG`.

use anyhow::Result;
use devcamper::prelude::*;
use devcamper::storage::seed;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const CONFIG_ENV: &str = "DEVCAMPER_CONFIG";
const DEFAULT_CONFIG: &str = "demos/directory_api/config.yaml";
const DEFAULT_DATA_DIR: &str = "demos/directory_api/_data";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("devcamper=debug,tower_http=info")),
        )
        .init();

    let config = load_config()?;
    let db = register_relations(InMemoryDatabase::new());

    let import = std::env::args().skip(1).any(|arg| arg == "-i");

    let seed_dir = match (&config.seed_dir, import) {
        (Some(dir), _) => Some(dir.clone()),
        (None, true) => Some(PathBuf::from(DEFAULT_DATA_DIR)),
        (None, false) => None,
    };
    if let Some(dir) = seed_dir {
        let report = seed::import_dir(&db, &dir).await?;
        tracing::info!(?report, dir = %dir.display(), "Data imported");
    }

    print_routes(&config);

    let addr = config.server.address();
    ServerBuilder::from_config(&config)
        .with_database(db)
        .serve(&addr)
        .await
}

fn load_config() -> Result<AppConfig> {
    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG.to_string());
    let config = if Path::new(&path).exists() {
        tracing::info!(path = %path, "Loading configuration");
        AppConfig::from_yaml_file(&path)?
    } else {
        tracing::warn!(path = %path, "Configuration file not found, using defaults");
        AppConfig::default()
    };
    Ok(config.with_env_overrides())
}

fn print_routes(config: &AppConfig) {
    let base = format!("http://{}{}", config.server.address(), config.api_prefix);

    println!("\n🌐 DevCamper API running on {}", base);
    println!("\n  📚 Bootcamps:");
    println!("    GET    /bootcamps?averageCost[lte]=10000&select=name,careers&sort=-averageCost");
    println!("    GET    /bootcamps?location[state]=MA&careers[in]=Business,UI/UX&page=2&limit=2");
    println!("    POST   /bootcamps                       - publisher/admin");
    println!("    GET    /bootcamps/{{id}}  PUT/DELETE owner or admin");
    println!("    GET    /bootcamps/{{id}}/courses  POST publisher/admin");
    println!("    GET    /bootcamps/{{id}}/reviews  POST user/admin");
    println!("\n  🎓 Courses and reviews:");
    println!("    GET    /courses?tuition[gte]=10000&minimumSkill=beginner");
    println!("    GET    /reviews?rating[gt]=6&sort=-rating");
    println!("\n  👤 Auth:");
    println!("    GET    /auth/me   PUT /auth/updatedetails");
    println!("    GET    /auth/users?role=publisher      - admin");
    println!("\n  🔑 Tokens (Authorization: Bearer <token>):");
    for credential in &config.credentials {
        println!("    {:<22} {}", credential.token, credential.role);
    }
    println!();
}
