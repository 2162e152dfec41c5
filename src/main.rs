//! slotdb page inspector - fills a page with sample rows and dumps its layout

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use log::info;
use slotdb::access::Row;
use slotdb::statement::{Column, ColumnType, CreateTableData, InsertData, TableSchema};
use slotdb::storage::{Page, PageManager, StorageError};
use std::path::PathBuf;

/// slotdb page inspector
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of sample rows to insert (stops early if the page fills up)
    #[arg(short, long, default_value = "8")]
    rows: u32,

    /// Delete every N-th inserted row before compacting (0 disables deletes)
    #[arg(short = 'x', long, default_value = "3")]
    delete_every: u32,

    /// Store the page in this file instead of memory
    #[arg(short = 'f', long)]
    data_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let mut page_manager = match &args.data_file {
        Some(path) => PageManager::create(path)
            .with_context(|| format!("Failed to create page file: {}", path.display()))?,
        None => PageManager::in_memory(),
    };

    let schema = TableSchema::from_create(&CreateTableData {
        table_name: "users".to_string(),
        columns: vec![
            Column::new("id", ColumnType::Int),
            Column::new("username", ColumnType::Text),
            Column::new("email", ColumnType::Text),
            Column::new("active", ColumnType::Bool),
        ],
    })
    .context("Failed to build users schema")?;

    let mut page = page_manager
        .allocate_page()
        .context("Failed to allocate page")?;
    info!("allocated page {:?}", page.page_id());

    let inserted = fill_page(&mut page, &schema, args.rows)?;
    info!("inserted {} rows", inserted);
    print_page(&mut page)?;

    if args.delete_every > 0 {
        let mut slotted = page.slotted();
        for slot_id in (0..inserted as u16).filter(|id| (*id as u32 + 1) % args.delete_every == 0) {
            slotted.delete_row(slot_id)?;
        }
        let reclaimed = slotted.compact().context("Failed to compact page")?;
        info!("compaction reclaimed {} bytes", reclaimed);
        print_page(&mut page)?;
    }

    page_manager
        .write_page(&page)
        .context("Failed to write page")?;

    Ok(())
}

fn fill_page(page: &mut Page, schema: &TableSchema, rows: u32) -> Result<u32> {
    let mut slotted = page.slotted();
    for i in 0..rows {
        let insert = InsertData::new(
            &schema.table_name,
            [
                ("id".to_string(), (i + 1).to_string()),
                ("username".to_string(), format!("\"user_{}\"", i + 1)),
                ("email".to_string(), format!("\"user_{}@example.com\"", i + 1)),
                ("active".to_string(), (i % 2 == 0).to_string()),
            ],
        );
        let row = schema.build_row(&insert)?;
        match slotted.insert(&row) {
            Ok(_) => {}
            Err(StorageError::PageFull { .. }) => return Ok(i),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(rows)
}

fn print_page(page: &mut Page) -> Result<()> {
    let page_id = page.page_id();
    let slotted = page.slotted();
    let header = slotted.read_header()?;

    println!("Page {}: {:?}", page_id.0, header);
    println!(
        "  slot directory ends at {}, {} bytes free",
        header.slot_directory_end(),
        header.free_space()
    );
    for (slot_id, slot) in slotted.slots()?.into_iter().enumerate() {
        if slot.is_deleted() {
            println!("  [{}] deleted", slot_id);
            continue;
        }
        let row: Row = slotted.read_row(slot_id as u16)?;
        println!(
            "  [{}] offset={} length={} {}",
            slot_id, slot.offset, slot.length, row
        );
    }
    Ok(())
}
