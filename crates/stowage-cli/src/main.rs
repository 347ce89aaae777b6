use std::{env, path::PathBuf, sync::Arc};

use clap::Parser;
use cli::{Args, Commands};
use logging::setup_logging;
use models::{ChannelMessage, RecentChannelMessages};
use nu_ansi_term::Color::{Blue, Cyan, Green, Yellow};
use stowage_config::{config::config_path, utils::resolve_path, Config};
use stowage_core::{
    error::StowageError, CachedRepository, Context, LocalRepository, Query, Repository,
    StowageResult,
};
use tracing::{debug, info, warn};
use utils::{set_color, Colored};

mod cli;
mod logging;
mod models;
mod utils;

fn config_file(args: &Args) -> StowageResult<PathBuf> {
    let Some(ref c) = args.config else {
        return Ok(config_path());
    };

    let path = resolve_path(c)?;
    if path.is_absolute() {
        return Ok(path);
    }
    env::current_dir()
        .map(|dir| dir.join(&path))
        .map_err(|e| StowageError::Config(e.into()))
}

async fn post(
    repo: &CachedRepository<LocalRepository>,
    channel: String,
    text: String,
    author: String,
    id: Option<String>,
) -> StowageResult<()> {
    let mut message = ChannelMessage::new(&channel, &author, &text);
    if let Some(id) = id {
        message.id = id;
    }
    let id = message.id.clone();

    repo.save(message).await?;
    info!("Posted {} to {}", Colored(Cyan, &id), Colored(Green, &channel));
    Ok(())
}

async fn recent(
    repo: &CachedRepository<LocalRepository>,
    channel: String,
    limit: u32,
    twice: bool,
) -> StowageResult<()> {
    let query = || RecentChannelMessages {
        channel_name: channel.clone(),
        limit,
    };
    debug!("fetching {}", query().signature());

    let messages = repo.fetch(query()).await?;
    if messages.is_empty() {
        info!("No messages in {}", Colored(Green, &channel));
    }
    for m in messages.iter() {
        info!(
            "{} {}: {}",
            Colored(Blue, m.posted_date.format("%Y-%m-%d %H:%M:%S")),
            Colored(Green, &m.author),
            m.text
        );
    }

    if twice {
        let again = repo.fetch(query()).await?;
        info!(
            "Second fetch served from cache: {}",
            Colored(Yellow, Arc::ptr_eq(&messages, &again))
        );
    }

    Ok(())
}

fn schema(repo: &LocalRepository, apply: bool) -> StowageResult<()> {
    let pending = repo.pending_migration::<ChannelMessage>()?;
    if pending.is_empty() {
        info!("Schema is up to date");
        return Ok(());
    }

    for statement in &pending {
        info!("{statement}");
    }

    if apply {
        repo.ensure_table::<ChannelMessage>()?;
        info!("Applied {} statement(s)", Colored(Green, pending.len()));
    } else {
        warn!("Run with --apply to migrate");
    }
    Ok(())
}

fn init_config(path: PathBuf, force: bool) -> StowageResult<()> {
    if path.exists() && !force {
        warn!(
            "Config already exists at {}; use --force to overwrite",
            path.display()
        );
        return Ok(());
    }
    Config::default_config().save(&path)?;
    Ok(())
}

async fn handle_cli() -> StowageResult<()> {
    let args = Args::parse();
    set_color(!args.no_color);
    let path = config_file(&args)?;

    if let Commands::InitConfig {
        force,
    } = args.command
    {
        setup_logging(&args, "info");
        return init_config(path, force);
    }

    let mut config = Config::load(Some(&path))?;
    setup_logging(&args, config.log_level());
    debug!("using config {}", path.display());

    if let Some(ref db) = args.db {
        config.store.path = Some(db.clone());
    }
    let ctx = Context::new(config)?;

    match args.command {
        Commands::Post {
            channel,
            text,
            author,
            id,
        } => post(&ctx.open_local()?, channel, text, author, id).await,
        Commands::Recent {
            channel,
            limit,
            twice,
        } => recent(&ctx.open_local()?, channel, limit, twice).await,
        Commands::Schema {
            apply,
        } => schema(&ctx.local()?, apply),
        Commands::InitConfig {
            ..
        } => Ok(()),
    }
}

#[tokio::main]
async fn main() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    if let Err(err) = handle_cli().await {
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(1);
    }
}
