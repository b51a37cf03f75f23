use anyhow::Result;
use clap::Parser;
use snackroute::api::session::{self, StorageType};
use snackroute::cli::{Cli, Commands};
use snackroute::lookup::{LookupService, UserTable};
use snackroute::notify::{Notification, Notifier, WebhookNotifier};
use snackroute::{api, utils, Settings};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::new()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.logging.level.clone())),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Route {
            query,
            table,
            notify,
            subject,
        } => handle_route(settings, query, table, notify, subject).await,
        Commands::Chat {
            llm_classifier,
            memory,
            session_id,
            storage_dir,
        } => handle_chat(llm_classifier, memory, session_id, storage_dir).await,
        Commands::Batch { file, concurrency } => handle_batch(settings, file, concurrency).await,
    }
}

async fn load_table(table: Option<PathBuf>) -> Result<Arc<dyn LookupService>> {
    Ok(match table {
        Some(path) => Arc::new(UserTable::load_json(path).await?),
        None => Arc::new(UserTable::sample()),
    })
}

async fn handle_route(
    settings: Settings,
    query: String,
    table: Option<PathBuf>,
    notify: bool,
    subject: String,
) -> Result<()> {
    let service = load_table(table).await?;
    let report =
        api::route_query_with_service(service, &query, settings.routing.max_hops).await?;

    println!(
        "{} {}",
        utils::category_badge(&report.category),
        report.reply
    );
    if let Some(failure) = &report.failure {
        utils::print_error(&format!("Handler failure: {}", failure));
    }

    if notify {
        deliver_notification(&settings, &report, subject).await;
    }

    Ok(())
}

async fn deliver_notification(settings: &Settings, report: &api::RouteReport, subject: String) {
    let Some(contact) = &report.contact else {
        utils::print_info("No single contact matched; nothing to notify");
        return;
    };

    let Some(notifier) = WebhookNotifier::from_config(&settings.notify) else {
        utils::print_error("No notification endpoint configured (notify.endpoint)");
        return;
    };

    let notification = Notification {
        contact: contact.clone(),
        subject,
        body: report.reply.clone(),
    };

    match notifier.deliver(&notification).await {
        Ok(receipt) => {
            utils::print_success(&format!("Notification sent to {}", receipt.contact))
        }
        Err(e) => utils::print_error(&format!("Notification delivery failed: {:#}", e)),
    }
}

async fn handle_chat(
    llm_classifier: bool,
    memory: bool,
    session_id: String,
    storage_dir: String,
) -> Result<()> {
    let storage_type = if memory {
        StorageType::FileSystem(PathBuf::from(storage_dir))
    } else {
        StorageType::Memory
    };

    let mut session =
        session::create_session(session_id.clone(), storage_type, llm_classifier).await?;

    utils::print_header("Interactive Chat");
    if memory {
        let count = session.message_count();
        if count > 0 {
            utils::print_success(&format!(
                "Resumed session '{}' with {} previous messages",
                session_id, count
            ));
        } else {
            utils::print_success(&format!("New session '{}' created", session_id));
        }
    }
    utils::print_info("Type your messages (Ctrl+C to exit, /help for commands)\n");

    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin);

    loop {
        utils::print_prompt("You: ");
        let mut input = String::new();
        if reader.read_line(&mut input).await? == 0 {
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            "/clear" => {
                session.clear_history().await?;
                utils::print_success("Session history cleared\n");
                continue;
            }
            "/count" => {
                utils::print_info(&format!("Messages in session: {}\n", session.message_count()));
                continue;
            }
            "/help" => {
                println!("Special commands:");
                println!("  /clear  - Clear session history");
                println!("  /count  - Show message count");
                println!("  /help   - Show this help");
                println!("  Ctrl+C  - Exit\n");
                continue;
            }
            _ => {}
        }

        match session.send_message(input).await {
            Ok(report) => {
                println!(
                    "{} {}\n",
                    utils::category_badge(&report.category),
                    report.reply
                );
            }
            Err(e) => utils::print_error(&format!("Run failed: {:#}\n", e)),
        }
    }

    Ok(())
}

async fn handle_batch(settings: Settings, file: String, concurrency: usize) -> Result<()> {
    utils::print_info(&format!(
        "Routing queries from {} with concurrency {}",
        file, concurrency
    ));

    let file = File::open(file).await?;
    let reader = BufReader::new(file);
    let mut lines = reader.lines();

    let mut queries = vec![];
    while let Some(line) = lines.next_line().await? {
        if !line.trim().is_empty() {
            queries.push(line);
        }
    }

    let results = api::batch::route_queries(
        Arc::new(UserTable::sample()),
        queries,
        concurrency,
        settings.routing.max_hops,
    )
    .await;

    for result in &results {
        match result {
            Ok(report) => {
                println!(
                    "{} {} -> {}",
                    utils::category_badge(&report.category),
                    report.query,
                    report.reply
                );
            }
            Err(e) => utils::print_error(&format!("Query failed: {:#}", e)),
        }
    }

    Ok(())
}
