use anyhow::{anyhow, Context};
use clap::{Arg, Command};
use review_ingest::{
    import_reviews_from_path, DatePolicy, ImportOptions, MemoryStore, StandardSanitizer,
};
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let matches = Command::new("review-import")
        .about("Import product reviews from a CSV file")
        .arg(
            Arg::new("csv")
                .long("csv")
                .value_parser(clap::value_parser!(PathBuf))
                .required(true),
        )
        .arg(
            Arg::new("products")
                .long("products")
                .help("Product catalogue CSV with `sku` and `id` columns")
                .value_parser(clap::value_parser!(PathBuf))
                .required(true),
        )
        .arg(
            Arg::new("out")
                .long("out")
                .help("Write the resulting store as JSON here instead of stdout")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("date-policy")
                .long("date-policy")
                .help("What to do with unreadable dates: epoch or reject")
                .value_parser(clap::value_parser!(DatePolicy))
                .default_value("epoch"),
        )
        .arg(
            Arg::new("charset")
                .long("charset")
                .help("Input character encoding label, e.g. windows-1252")
                .default_value("utf-8"),
        )
        .arg(Arg::new("delimiter").long("delimiter").default_value(","))
        .get_matches();

    let csv_path = matches
        .get_one::<PathBuf>("csv")
        .ok_or_else(|| anyhow!("--csv is required"))?;
    let products_path = matches
        .get_one::<PathBuf>("products")
        .ok_or_else(|| anyhow!("--products is required"))?;

    let charset_label = matches
        .get_one::<String>("charset")
        .map(String::as_str)
        .unwrap_or("utf-8");
    let charset = encoding_rs::Encoding::for_label(charset_label.as_bytes())
        .ok_or_else(|| anyhow!("unknown charset '{charset_label}'"))?;

    let delimiter = match matches.get_one::<String>("delimiter").map(String::as_bytes) {
        Some([b]) => *b,
        Some(other) => {
            return Err(anyhow!(
                "delimiter must be a single byte, got {:?}",
                String::from_utf8_lossy(other)
            ))
        }
        None => b',',
    };
    let date_policy = matches
        .get_one::<DatePolicy>("date-policy")
        .copied()
        .unwrap_or_default();
    let options = ImportOptions::default()
        .with_delimiter(delimiter)
        .with_date_policy(date_policy);

    let mut store = MemoryStore::new();
    let catalogue = tokio::fs::File::open(products_path)
        .await
        .with_context(|| format!("opening product catalogue {}", products_path.display()))?;
    let loaded = store.load_products(catalogue).await?;
    tracing::info!(products = loaded, "product catalogue loaded");

    let report =
        import_reviews_from_path(csv_path, charset, &mut store, &StandardSanitizer, &options)
            .await?;
    eprintln!("{report}");

    let json = serde_json::to_vec_pretty(store.snapshot())?;
    match matches.get_one::<PathBuf>("out") {
        Some(path) => tokio::fs::write(path, &json)
            .await
            .with_context(|| format!("writing {}", path.display()))?,
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&json).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}
