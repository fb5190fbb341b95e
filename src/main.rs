use riskbook::config::{self, ApiConfig, ScrapeConfig};
use riskbook::{api, scraper};
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mode = std::env::args().nth(1).unwrap_or_else(|| "scrape".to_string());
    let result = match mode.as_str() {
        "scrape" => run_scrape(),
        "serve" => run_serve(),
        other => {
            eprintln!("unknown mode '{other}' (expected 'scrape' or 'serve')");
            std::process::exit(2);
        }
    };

    if let Err(e) = result {
        tracing::error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run_scrape() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = ScrapeConfig::from_env()?;
    let report = scraper::run(&cfg)?;

    println!(
        "collected {} records -> {}",
        report.rows,
        report.csv_path.display()
    );
    match &report.published_url {
        Some(url) => println!("published: {url}"),
        None => println!("publish skipped (GITHUB_TOKEN not set)"),
    }
    Ok(())
}

fn run_serve() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = ApiConfig::from_env()?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(api::serve(cfg))?;
    Ok(())
}
