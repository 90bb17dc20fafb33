use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use ilearn::{logger, AppConfig, AppState, ChatGateway, SupabaseRecordStore};

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    logger::init();
    if dotenv_loaded {
        info!("Environment variables loaded from .env");
    }

    let config = AppConfig::from_env().context("failed to load configuration")?;

    let store = SupabaseRecordStore::from_config(&config)
        .context("failed to create Supabase client")?;
    let chat = ChatGateway::from_config(&config).context("failed to create chat gateway")?;

    info!("Chat API at {}", chat.base_url());
    let state = Arc::new(AppState::new(Arc::new(store), chat));

    ilearn::start_web_server(&config.bind_addr, state).await
}
