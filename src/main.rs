use std::sync::Arc;

use robuxrate::bot::{register_commands, run_dispatcher, Config, Processor, Router};
use teloxide::prelude::*;

#[tokio::main]
pub async fn main() {
    dotenv::dotenv().ok();
    pretty_env_logger::init();
    log::info!("Starting Robux rate bot...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            log::error!("Invalid configuration: {}", err);
            std::process::exit(1);
        }
    };

    let rate_source = match config.build_rate_source() {
        Ok(source) => source,
        Err(err) => {
            log::error!("Cannot set up exchange rates: {}", err);
            std::process::exit(1);
        }
    };

    let processor = Processor::new(config.rate_table(), config.policy, rate_source);
    let router = Arc::new(Router::new(Arc::new(processor)));

    let bot = Bot::new(config.token.clone());
    match bot.get_me().await {
        Ok(me) => log::info!("Connected as @{}", me.username()),
        Err(err) => {
            log::error!("Cannot connect to Telegram: {}", err);
            std::process::exit(1);
        }
    }

    if let Err(err) = register_commands(&bot).await {
        log::error!("Error registering commands: {}", err);
    }

    log::info!("Robux rate bot started successfully!");

    run_dispatcher(bot, router).await;
}
