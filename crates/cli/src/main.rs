use clap::Parser;
use strider_core::{Engine, EngineConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "strider", about = "Open a page and submit its first form")]
struct Cli {
    /// The URI to open
    uri: String,

    /// Print a JSON summary of the final response
    #[arg(long)]
    json: bool,

    /// Don't follow redirects
    #[arg(long)]
    no_redirect: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Failures are reported, never turned into a failing exit status
    if let Err(e) = run(&cli) {
        println!("Error: {}", e);
    }
}

fn run(cli: &Cli) -> strider_core::Result<()> {
    let config = EngineConfig {
        follow_redirects: !cli.no_redirect,
        ..Default::default()
    };
    tracing::debug!(uri = %cli.uri, "opening page");
    let mut engine = Engine::with_config(&cli.uri, config)?;
    engine.select("form")?.first().submit()?;

    let uri = engine.uri().map(|u| u.to_string()).unwrap_or_default();
    let Some(response) = engine.response() else {
        return Ok(());
    };

    if cli.json {
        let summary = serde_json::json!({
            "uri": uri,
            "status": response.status,
            "headers": response.headers,
            "title": engine.document().and_then(|doc| doc.title()),
            "history": engine.history().len(),
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{}", text),
            Err(e) => println!("Error: {}", e),
        }
    } else {
        println!("uri: {}", uri);
        println!("status: {}", response.status);
        if let Some(title) = engine.document().and_then(|doc| doc.title()) {
            println!("title: {}", title);
        }
    }
    Ok(())
}
