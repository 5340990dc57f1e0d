use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use volo_agents::{Assistant, HotelConcierge, DEFAULT_ASSISTANT_TIMEOUT};
use volo_core::{ChatContext, ChatTurn, Preferences, RawSearchParams, ReviewSort};
use volo_ml::ModelBackend;
use volo_observability::{init_tracing, AppMetrics};
use volo_storage::Store;

type Concierge = HotelConcierge<Store, ModelBackend>;

#[derive(Debug, Parser)]
#[command(name = "volo")]
#[command(about = "Volo hotel search CLI")]
struct Cli {
    /// sqlite URL; the seeded in-memory catalog is used when absent.
    #[arg(long, env = "VOLO_DATABASE_URL")]
    database_url: Option<String>,

    #[arg(long, env = "VOLO_ASSISTANT_TIMEOUT_MS")]
    assistant_timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Filter the catalog.
    Search(SearchArgs),
    /// Show one hotel with its price and review statistics.
    Hotel { id: String },
    Reviews {
        id: String,
        #[arg(long, default_value = "newest")]
        sort: String,
    },
    /// Filter, then rank against traveller preferences.
    Rank {
        #[command(flatten)]
        search: SearchArgs,
        #[arg(long = "prefer-destination")]
        prefer_destination: Option<String>,
        #[arg(long = "min-rating")]
        min_rating: Option<f64>,
        #[arg(long)]
        budget: Option<u32>,
        #[arg(long = "prefer-amenity")]
        preferred_amenities: Vec<String>,
    },
    Chat {
        #[arg(long)]
        hotel: Option<String>,
    },
    Optimize { query: String },
}

#[derive(Debug, Args)]
struct SearchArgs {
    #[arg(long)]
    destination: Option<String>,
    #[arg(long)]
    min_price: Option<String>,
    #[arg(long)]
    max_price: Option<String>,
    #[arg(long)]
    rating: Option<String>,
    /// Comma separated, e.g. `wifi,pool`.
    #[arg(long)]
    amenities: Option<String>,
}

impl From<SearchArgs> for RawSearchParams {
    fn from(args: SearchArgs) -> Self {
        RawSearchParams {
            destination: args.destination,
            min_price: args.min_price,
            max_price: args.max_price,
            rating: args.rating,
            amenities: args.amenities,
            ..RawSearchParams::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("volo_cli");
    let cli = Cli::parse();

    let timeout = cli
        .assistant_timeout_ms
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_ASSISTANT_TIMEOUT);
    let concierge = build_concierge(cli.database_url.as_deref(), timeout).await?;

    match cli.command {
        Command::Search(args) => {
            let results = concierge.search(&args.into()).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Command::Hotel { id } => {
            let details = concierge
                .hotel(&id)
                .await?
                .with_context(|| format!("no hotel with id {id}"))?;
            println!("{}", serde_json::to_string_pretty(&details)?);
        }
        Command::Reviews { id, sort } => {
            let sort = ReviewSort::parse(&sort).context("invalid --sort value")?;
            let reviews = concierge
                .reviews(&id, sort)
                .await?
                .with_context(|| format!("no hotel with id {id}"))?;
            println!("{}", serde_json::to_string_pretty(&reviews)?);
        }
        Command::Rank {
            search,
            prefer_destination,
            min_rating,
            budget,
            preferred_amenities,
        } => {
            let preferences = Preferences {
                destination: prefer_destination,
                min_rating,
                budget,
                preferred_amenities,
                ..Preferences::default()
            };
            let ranked = concierge.rank(&search.into(), &preferences).await?;
            println!("{}", serde_json::to_string_pretty(&ranked)?);
        }
        Command::Chat { hotel } => run_chat(concierge, hotel).await?,
        Command::Optimize { query } => {
            println!("{}", concierge.optimize_query(&query).await);
        }
    }

    Ok(())
}

async fn run_chat(concierge: Concierge, current_hotel: Option<String>) -> Result<()> {
    let mut context = ChatContext {
        current_hotel,
        ..ChatContext::default()
    };

    println!("Volo assistant chat mode. type 'exit' to quit.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }
        if message.is_empty() {
            continue;
        }

        let reply = concierge.chat(message, &context).await;
        println!("\n{}\n", reply.response);

        if !reply.suggestions.is_empty() {
            println!("Suggestions:");
            for suggestion in &reply.suggestions {
                println!("- {suggestion}");
            }
            println!();
        }

        if reply.success {
            context.conversation_history.push(ChatTurn {
                role: "user".to_string(),
                content: message.to_string(),
            });
            context.conversation_history.push(ChatTurn {
                role: "assistant".to_string(),
                content: reply.response,
            });
        }
    }

    Ok(())
}

async fn build_concierge(database_url: Option<&str>, timeout: Duration) -> Result<Concierge> {
    let metrics = AppMetrics::shared();

    let store = match database_url {
        Some(database_url) => Store::sqlite(database_url).await?,
        None => Store::memory(),
    };
    let model = ModelBackend::from_env()?;

    Ok(HotelConcierge::new(
        Arc::new(store),
        Assistant::new(Arc::new(model), timeout, metrics.clone()),
        metrics,
    ))
}
