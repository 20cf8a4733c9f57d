use anyhow::Context;
use clap::{Parser, Subcommand};
use mxmfetch::config::{self, SESSION_TOKEN_ENV};
use mxmfetch::{SongClient, TrackSummary, Transport, playlist};
use serde_json::Value;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "mxmfetch", version, about = "Get track details and lyrics from Musixmatch")]
struct Cli {
    /// Override config file path.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Number of tries to get a network response.
    #[arg(short = 'T', long, global = true)]
    tries: Option<u32>,

    /// Per-attempt timeout in seconds.
    #[arg(short = 't', long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search a keyword and show the track it resolves to.
    Search {
        keyword: String,
        /// Which search result to use.
        #[arg(short, long, default_value_t = 0)]
        index: usize,
    },
    /// List every page address found for a keyword.
    Urls { keyword: String },
    /// Show the track behind a page address.
    Url { address: String },
    /// Dump the embedded state literal as found in the page.
    Raw { address: String },
    /// Dump the embedded state as pretty JSON.
    Json { address: String },
    /// Look up every entry of an M3U playlist by its title/artist tags.
    Playlist { path: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let mut cfg = config::load(cli.config.as_deref()).context("load config")?;
    if let Some(tries) = cli.tries {
        cfg.session.tries = tries;
    }
    if let Some(timeout) = cli.timeout {
        cfg.session.timeout_secs = timeout;
    }

    let token = std::env::var(SESSION_TOKEN_ENV).ok();
    if token.is_none() {
        tracing::warn!("{SESSION_TOKEN_ENV} is not set; track pages may refuse the request");
    }
    let client = SongClient::new(cfg.session(token).context("session settings")?)?
        .with_resolver(cfg.resolver().context("search settings")?)
        .with_extractor(cfg.extractor().context("page settings")?);

    match cli.command {
        Command::Search { keyword, index } => {
            let state = client
                .fetch_by_keyword(&keyword, index)
                .await
                .with_context(|| format!("could not get data from {keyword:?}"))?;
            print_summary(&TrackSummary::from_state(&state));
        }
        Command::Urls { keyword } => {
            let urls = client
                .resolve_candidates(&keyword)
                .await
                .with_context(|| format!("no URLs found for {keyword:?}"))?;
            println!("These are all URL we found:\n");
            for (i, url) in urls.iter().enumerate() {
                println!("    {i} - {url}");
            }
        }
        Command::Url { address } => {
            ensure_supported(&client, &address)?;
            let state = client
                .fetch_structured(&address)
                .await
                .with_context(|| format!("could not get data from {address:?}"))?;
            print_summary(&TrackSummary::from_state(&state));
        }
        Command::Raw { address } => {
            ensure_supported(&client, &address)?;
            println!("{}", client.fetch_raw(&address).await?);
        }
        Command::Json { address } => {
            ensure_supported(&client, &address)?;
            let state = client.fetch_structured(&address).await?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        Command::Playlist { path } => {
            let mut entries = Vec::new();
            for audio in playlist::read_m3u(&path)? {
                match playlist::keyword_for(&audio) {
                    Ok(keyword) => entries.push((audio, keyword)),
                    Err(e) => eprintln!("Skipping {}: {e:#}", audio.display()),
                }
            }
            for lookup in lookup_playlist(&client, entries).await {
                match lookup.outcome {
                    Ok(state) => {
                        println!("{}:", lookup.keyword);
                        print_summary(&TrackSummary::from_state(&state));
                    }
                    Err(e) => eprintln!(
                        "Could not get data from {} ({}): {e}",
                        lookup.keyword,
                        lookup.audio.display()
                    ),
                }
            }
        }
    }

    Ok(())
}

struct Lookup {
    audio: PathBuf,
    keyword: String,
    outcome: mxmfetch::Result<Value>,
}

/// Looks every entry up once, then gives the ones that failed on the
/// network one more round at the end of the list.
async fn lookup_playlist<T: Transport>(
    client: &SongClient<T>,
    entries: Vec<(PathBuf, String)>,
) -> Vec<Lookup> {
    let mut done = Vec::with_capacity(entries.len());
    let mut deferred = Vec::new();
    for (audio, keyword) in entries {
        println!("Working on {keyword}...");
        match client.fetch_by_keyword(&keyword, 0).await {
            Err(e) if e.is_transient() => {
                tracing::warn!("{keyword}: {e}; retrying after the rest of the playlist");
                deferred.push((audio, keyword));
            }
            outcome => done.push(Lookup { audio, keyword, outcome }),
        }
    }
    for (audio, keyword) in deferred {
        let outcome = client.fetch_by_keyword(&keyword, 0).await;
        done.push(Lookup { audio, keyword, outcome });
    }
    done
}

fn ensure_supported<T: Transport>(
    client: &SongClient<T>,
    address: &str,
) -> anyhow::Result<()> {
    if !client.is_supported_address(address) {
        anyhow::bail!("inappropriate URL form: {address}");
    }
    Ok(())
}

fn print_summary(t: &TrackSummary) {
    let unknown = "unknown";
    println!(
        "Track: \"{}\" from \"{}\"",
        t.name.as_deref().unwrap_or(unknown),
        t.artist.as_deref().unwrap_or(unknown)
    );
    println!("Album: {}", t.album.as_deref().unwrap_or(unknown));
    println!("Genre: {}", t.genre.as_deref().unwrap_or(unknown));
    println!("Lyrics:\n{}\n", t.lyrics_text());
}
