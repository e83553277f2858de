mod classify;
mod config;
mod error;
mod fetch;
mod refine;
mod store;
mod summary;
mod utils;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::config::Settings;
use crate::fetch::categories::{fetch_categories, HttpWikiApi};
use crate::fetch::pages::{fetch_all, HttpPageSource, FILTERED_PAGE_LIMIT, FULL_PAGE_LIMIT};
use crate::refine::items::TaggedItem;
use crate::store::{read_json, write_json, RecordStore, Records};
use crate::summary::Summary;

#[derive(Parser)]
#[command(name = "dst_wiki", about = "Fetch, filter and tag data from the Don't Starve wiki")]
struct Cli {
    /// Directory holding the JSON documents (overrides DSTWIKI_WORKDIR)
    #[arg(short, long, global = true)]
    workdir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every Data: record page by page into wiki_data.json
    Fetch {
        /// Zero-based page to resume from
        #[arg(short, long, default_value = "0")]
        start_from: u32,
        /// Let the server drop localization and translation tables (updates an existing wiki_data.json)
        #[arg(long)]
        filtered: bool,
    },
    /// Fetch all categories and their member titles into allcategories.json
    Categories,
    /// Drop ignored record groups and split the rest into one document per field
    Filter,
    /// Derive item tags from ItemData.json
    Items,
    /// Build the item name table from ItemTable.json
    ItemNames,
    /// Normalize DSTMobInfo.json flags and attitudes
    Mobs,
    /// Build mob and item filters from the tagged documents and print them (default)
    Summary,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let mut settings = Settings::load().context("Failed to load settings")?;
    if let Some(dir) = cli.workdir {
        settings.workdir = dir;
    }
    info!(settings = ?settings, "Starting");

    let result = match cli.command.unwrap_or(Commands::Summary) {
        Commands::Fetch {
            start_from,
            filtered,
        } => run_fetch(&settings, start_from, filtered),
        Commands::Categories => run_categories(&settings),
        Commands::Filter => run_filter(&settings),
        Commands::Items => run_items(&settings),
        Commands::ItemNames => run_item_names(&settings),
        Commands::Mobs => run_mobs(&settings),
        Commands::Summary => run_summary(&settings),
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn load_records(settings: &Settings, file: &str) -> Result<Records> {
    let path = settings.path(file);
    read_json(&path).with_context(|| format!("Failed to read {:?}", path))
}

fn save<T: serde::Serialize + ?Sized>(settings: &Settings, file: &str, value: &T) -> Result<()> {
    let path = settings.path(file);
    write_json(&path, value).with_context(|| format!("Failed to write {:?}", path))
}

fn run_fetch(settings: &Settings, start_from: u32, filtered: bool) -> Result<()> {
    let path = settings.path(config::WIKI_DATA_FILE);
    let client = fetch::client(settings)?;
    let source = HttpPageSource::new(client, &settings.host, settings.page_size);

    let (mut source, mut store, limit) = if filtered {
        let store = RecordStore::open(&path)
            .with_context(|| format!("Filtered fetch updates an existing {:?}", path))?;
        (source.filtered(), store, FILTERED_PAGE_LIMIT)
    } else {
        (source, RecordStore::open_or_empty(&path)?, FULL_PAGE_LIMIT)
    };

    if store.is_empty() {
        println!("Starting a new {:?}", store.path());
    } else {
        println!("Resuming with {} records from {:?}", store.len(), store.path());
    }
    let stats = fetch_all(
        &mut source,
        &mut store,
        start_from,
        limit,
        settings.request_delay(),
    )?;
    println!(
        "Fetched {} pages ({} records), {} records stored.",
        stats.pages, stats.records, stats.stored
    );
    Ok(())
}

fn run_categories(settings: &Settings) -> Result<()> {
    let out = settings.path(config::CATEGORIES_FILE);
    let mut api = HttpWikiApi::new(fetch::client(settings)?, &settings.host);
    let report = fetch_categories(&mut api, &out, settings.request_delay())?;

    println!(
        "Saved {} categories ({} members) to {:?}",
        report.categories, report.members, out
    );
    if !report.truncated.is_empty() {
        warn!(
            "{} categories have more members than one response holds: {}",
            report.truncated.len(),
            report.truncated.join(", ")
        );
    }
    Ok(())
}

fn run_filter(settings: &Settings) -> Result<()> {
    let records = load_records(settings, config::WIKI_DATA_FILE)?;
    println!("Loaded {} records", records.len());

    let p = classify::partition(records);
    for (label, count) in &p.ignored {
        println!("  ignored {}: {}", label, count);
    }
    classify::write_partitions(&p, &settings.workdir, config::FILTERED_FILE)
        .context("Failed to write partitions")?;
    println!("Kept {} records in {} fields", p.kept.len(), p.fields.len());
    Ok(())
}

fn run_items(settings: &Settings) -> Result<()> {
    let records = load_records(settings, config::ITEM_DATA_FILE)?;
    let (tagged, report) = refine::items::tag_items(&records)?;

    if !report.unknown_keys.is_empty() {
        warn!("unknown keys: {:?}", report.unknown_keys);
    }
    save(settings, config::ITEM_TAG_FILE, &tagged)?;

    println!(
        "Tagged {} items ({} without tags dropped)",
        tagged.len(),
        report.dropped
    );
    println!(
        "AllTags: {}",
        report.all_tags.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
    );
    Ok(())
}

fn run_item_names(settings: &Settings) -> Result<()> {
    let records = load_records(settings, config::ITEM_TABLE_FILE)?;
    let table = refine::item_table::name_table(&records)?;
    save(settings, config::ITEM_STRING_FILE, &table)?;
    println!("Saved names for {} items", table.len());
    Ok(())
}

fn run_mobs(settings: &Settings) -> Result<()> {
    let mut records = load_records(settings, config::MOB_INFO_FILE)?;
    refine::mobs::normalize_mobs(&mut records)?;
    save(settings, config::MOB_TAG_FILE, &records)?;
    println!("Normalized {} mobs", records.len());
    Ok(())
}

fn run_summary(settings: &Settings) -> Result<()> {
    let mobs = load_records(settings, config::MOB_TAG_FILE)?;
    let items_path = settings.path(config::ITEM_TAG_FILE);
    let items: BTreeMap<String, TaggedItem> =
        read_json(&items_path).with_context(|| format!("Failed to read {:?}", items_path))?;

    Summary::build(&mobs, &items)?.print();
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
