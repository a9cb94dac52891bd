//! Quiz server bootstrap.
//!
//! ```text
//! quiz-server [CONFIG_JSON] [SEED_JSON]
//! ```
//!
//! Both paths are optional. Without a config file the defaults apply;
//! without a seed file the bundled `data/seed.json` is loaded.
//! `QUIZFORGE_BIND` overrides the bind address, `RUST_LOG` the log level.

use quizforge::prelude::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_SEED: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/seed.json");

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let mut config = match args.next() {
        Some(path) => ServerConfig::load(&path)?,
        None => ServerConfig::default(),
    };
    if let Ok(bind) = std::env::var("QUIZFORGE_BIND") {
        config.bind_addr = bind;
    }

    let seed_path = args.next().unwrap_or_else(|| DEFAULT_SEED.to_string());
    let repository = MemoryRepository::load(&seed_path)?;
    tracing::info!(seed = %seed_path, bind = %config.bind_addr, "starting quiz server");

    let server = QuizServerBuilder::from_config(config)
        .build(repository)
        .await?;

    server.run().await?;
    Ok(())
}
