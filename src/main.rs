use anyhow::Context;
use hls_playlist::Playlist;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hls_playlist=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("PLAYLIST").ok())
        .context("usage: hls-playlist <path> (or set PLAYLIST)")?;

    tracing::info!("Parsing {}", path);

    let text = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read {}", path))?;

    let playlist = Playlist::parse(&text).map_err(|e| {
        tracing::error!("{} ({})", e, e.error_code());
        e
    })?;

    tracing::info!(
        "Parsed {} playlist: {} segments, {} variants",
        if playlist.is_master() { "master" } else { "media" },
        playlist.segments().len(),
        playlist.variants().len()
    );

    println!("{}", serde_json::to_string_pretty(&playlist)?);

    Ok(())
}
