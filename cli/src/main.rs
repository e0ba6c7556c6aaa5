//! helix CLI binary: resolve clips by identifier or by scoped listing.
//!
//! Subcommands: `clips ids`, `clips query`, `cache clear`.

mod log_format;
mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cli::{ClipQuery, OutputFormat};
use config::HelixSettings;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(name = "helix")]
#[command(about = "helix: resolve Twitch clips by id or by broadcaster/game listing")]
struct Args {
    #[command(subcommand)]
    cmd: Command,

    /// Skip the cache for this run (no reads, no writes)
    #[arg(long, global = true)]
    no_cache: bool,

    /// SQLite cache file (default: HELIX_CACHE_PATH, or in-memory)
    #[arg(long, value_name = "PATH", global = true)]
    cache_path: Option<PathBuf>,

    /// Verbose: log chunk and page progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output items as JSON
    #[arg(long, global = true)]
    json: bool,

    /// When using --json, pretty-print (multi-line)
    #[arg(long, global = true)]
    pretty: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Look up clips
    Clips(ClipsArgs),
    /// Manage the local cache
    Cache(CacheArgs),
}

#[derive(clap::Args, Debug)]
struct ClipsArgs {
    #[command(subcommand)]
    sub: ClipsCommand,
}

#[derive(Subcommand, Debug)]
enum ClipsCommand {
    /// Resolve clips by identifier (cache first, then batched lookups)
    Ids(IdsArgs),
    /// Page through clips of one broadcaster or one game
    Query(QueryArgs),
}

#[derive(clap::Args, Debug)]
struct IdsArgs {
    /// Clip identifiers; duplicates are collapsed
    #[arg(required = true, num_args = 1.., value_name = "ID")]
    ids: Vec<String>,
}

#[derive(clap::Args, Debug)]
struct QueryArgs {
    #[arg(long, value_name = "ID")]
    broadcaster_id: Option<String>,
    #[arg(long, value_name = "ID")]
    game_id: Option<String>,
    /// RFC 3339 start of the listing window
    #[arg(long, value_name = "TIME")]
    started_at: Option<String>,
    /// RFC 3339 end of the listing window
    #[arg(long, value_name = "TIME")]
    ended_at: Option<String>,
    /// Number of clips to collect (default 20)
    #[arg(long, value_name = "N")]
    first: Option<usize>,
    /// Resume from a cursor printed by an earlier query
    #[arg(long, value_name = "CURSOR")]
    after: Option<String>,
}

#[derive(clap::Args, Debug)]
struct CacheArgs {
    #[command(subcommand)]
    sub: CacheCommand,
}

#[derive(Subcommand, Debug)]
enum CacheCommand {
    /// Remove every cached clip and response
    Clear,
}

fn output_format(args: &Args) -> OutputFormat {
    if args.json {
        OutputFormat::Json {
            pretty: args.pretty,
        }
    } else {
        OutputFormat::Text
    }
}

/// Cancels `token` on Ctrl-C.
fn cancel_on_interrupt(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling");
            token.cancel();
        }
    });
}

async fn run(args: Args, mut settings: HelixSettings) -> Result<(), cli::CliError> {
    if args.no_cache {
        settings.use_cache = false;
    }
    if let Some(path) = &args.cache_path {
        settings.cache_path = Some(path.clone());
    }

    let cache = cli::build_cache(&settings)?;

    if let Command::Cache(CacheArgs {
        sub: CacheCommand::Clear,
    }) = &args.cmd
    {
        if cli::clear_cache(cache.as_deref()).await? {
            println!("cache cleared");
        } else {
            println!("no cache configured");
        }
        return Ok(());
    }

    let resolver = cli::build_resolver(&settings, cache)?;
    let cancel = CancellationToken::new();
    cancel_on_interrupt(cancel.clone());

    let format = output_format(&args);
    let resolved = match args.cmd {
        Command::Clips(ClipsArgs {
            sub: ClipsCommand::Ids(ids),
        }) => {
            tracing::info!(count = ids.ids.len(), "resolving clips by id");
            cli::run_ids(&resolver, ids.ids, &cancel).await?
        }
        Command::Clips(ClipsArgs {
            sub: ClipsCommand::Query(q),
        }) => {
            tracing::info!("resolving clip listing");
            let query = ClipQuery {
                broadcaster_id: q.broadcaster_id,
                game_id: q.game_id,
                started_at: q.started_at,
                ended_at: q.ended_at,
                first: q.first,
                after: q.after,
            };
            cli::run_query(&resolver, query, &cancel).await?
        }
        Command::Cache(_) => return Ok(()),
    };

    if format == OutputFormat::Text {
        for warning in &resolved.warnings {
            eprintln!("warning: {}", warning);
        }
    }
    print!("{}", cli::render(&resolved, format)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loaded = config::load_and_apply("helix", None::<&std::path::Path>);
    let settings = match HelixSettings::from_env() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("helix: {}", e);
            std::process::exit(1);
        }
    };
    let _log_guard = logging::init(args.verbose, settings.log_dir.as_deref())?;
    if let Err(e) = loaded {
        tracing::warn!(error = %e, "config files not applied");
    }

    if let Err(e) = run(args, settings).await {
        eprintln!("helix: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
