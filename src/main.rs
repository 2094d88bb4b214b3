use async_trait::async_trait;
use clap::{Parser, Subcommand};
use restfeed::{
    ClientConfig, FeedClient, FeedRequest, FetchError, HttpMethod, PageHandler, PagedEnvelope,
    Pager, Record,
};

#[derive(Parser)]
#[command(name = "restfeed", about = "Fetch JSON feeds and follow their next links")]
struct Cli {
    /// Field name holding an error message in failure bodies. Repeat to add more;
    /// consulted in the order given. Overrides RESTFEED_ERROR_FLAGS.
    #[arg(long = "error-flag", global = true)]
    error_flags: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Issue one request and print the normalized envelope.
    Fetch {
        feed: String,
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,
        #[arg(long)]
        token: Option<String>,
        /// JSON object sent as the request body.
        #[arg(long)]
        data: Option<String>,
    },
    /// Walk a paginated feed, printing each record as one JSON line.
    Pages {
        feed: String,
        #[arg(long)]
        token: Option<String>,
        #[arg(long)]
        max_pages: Option<usize>,
    },
}

struct LinePrinter;

#[async_trait]
impl PageHandler for LinePrinter {
    async fn on_page(&mut self, results: &[Record], _is_last_page: bool) {
        for record in results {
            println!("{}", serde_json::Value::Object(record.clone()));
        }
    }

    async fn on_complete(&mut self, page: &PagedEnvelope) {
        if !page.success() {
            eprintln!(
                "restfeed: page failed ({}): {}",
                page.status_code()
                    .map(|code| code.to_string())
                    .unwrap_or_else(|| "no status".to_string()),
                page.message()
            );
        }
    }
}

async fn run(cli: Cli) -> Result<bool, FetchError> {
    let mut config = ClientConfig::from_env()?;
    if !cli.error_flags.is_empty() {
        config = config.with_error_flags(cli.error_flags);
    }

    match cli.command {
        Command::Fetch {
            feed,
            method,
            token,
            data,
        } => {
            let client = FeedClient::new(config)?;
            let mut request = FeedRequest::new(feed)
                .with_method(method.parse::<HttpMethod>()?)
                .with_optional_token(token);
            if let Some(raw) = data {
                let parameters: serde_json::Value = serde_json::from_str(&raw)?;
                request = request.with_parameters(&parameters)?;
            }
            let envelope = client.fetch(&request).await;
            println!("{}", serde_json::to_string_pretty(&envelope)?);
            Ok(envelope.success)
        }
        Command::Pages {
            feed,
            token,
            max_pages,
        } => {
            if max_pages.is_some() {
                config = config.with_max_pages(max_pages);
            }
            let client = FeedClient::new(config)?;
            let summary = Pager::new(&client)
                .run(&feed, token.as_deref(), &mut LinePrinter)
                .await;
            eprintln!("restfeed: {}", serde_json::to_string(&summary)?);
            Ok(summary.success)
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("restfeed: {}", err);
            std::process::exit(2);
        }
    }
}
