use clap::Parser;
use page_ledger::{PersistencyConfig, PersistencyManager};

mod args;
use args::{Args, Command};

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    let mut config = match PersistencyConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            ::log::error!("Failed to load configuration: {}", e);
            std::process::exit(2);
        }
    };
    config.apply_env_overrides();
    if let Some(run_id) = args.run_id {
        config.run_id = run_id;
    }

    let mut manager = match PersistencyManager::from_config(&config).await {
        Ok(manager) => manager,
        Err(e) => {
            ::log::error!("Failed to open stores: {}", e);
            std::process::exit(2);
        }
    };
    ::log::info!("Using run id {}", manager.run_id());

    if let Err(e) = run(&mut manager, args.command).await {
        ::log::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(manager: &mut PersistencyManager, command: Command) -> page_ledger::Result<()> {
    match command {
        Command::List { limit, scraped } => {
            let mut printed = 0;
            for record in manager.get_all(limit, scraped).await? {
                match record {
                    Ok(record) => {
                        println!("{}", serde_json::to_string(&record)?);
                        printed += 1;
                    }
                    // Keep going, a broken row should not hide the others
                    Err(e) => ::log::warn!("Skipping record: {}", e),
                }
            }
            ::log::info!("Printed {} records", printed);
        }
        Command::Filter { urls } => {
            for url in manager.filter_scraped_urls(&urls).await? {
                println!("{}", url);
            }
        }
        Command::WasScraped { url } => {
            println!("{}", manager.was_scraped(&url).await?);
        }
        Command::Delete { urls } => {
            manager.delete(&urls).await?;
            ::log::info!("Deleted {} urls", urls.len());
        }
        Command::StoreTemp {
            source,
            destination,
        } => {
            manager.store_temp_urls(&source, &destination).await?;
        }
        Command::ListTemp => {
            for name in manager.list_temp_urls().await? {
                println!("{}", name);
            }
        }
        Command::Classifiers => {
            for name in manager.list_classifiers().await? {
                println!("{}", name);
            }
        }
    }
    Ok(())
}
