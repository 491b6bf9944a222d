use std::env;
use std::path::PathBuf;
use tracing::{error, info};

use tourdesk::config::Config;
use tourdesk::export::ExportService;
use tourdesk::import::RowOutcome;
use tourdesk::record::{Collection, Record, RecordSchema, COMMENT_SCHEMA};
use tourdesk::BackOffice;

fn print_usage(program: &str) {
    eprintln!("Usage:");
    eprintln!("  {} import-comments <file.xlsx> [--yes]", program);
    eprintln!("  {} export-comments [dir]", program);
    eprintln!("  {} list <collection> [search]", program);
    eprintln!();
    eprintln!(
        "Collections: {}",
        Collection::ALL.map(|c| c.as_str()).join(", ")
    );
}

#[tokio::main]
async fn main() {
    // Use RUST_LOG env var if set, otherwise default to info level
    let log_filter = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(log_filter).init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("tourdesk");

    if args.len() < 2 {
        print_usage(program);
        std::process::exit(1);
    }

    if let Err(e) = run(program, &args[1..]).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(program: &str, args: &[String]) -> Result<(), String> {
    let config = Config::load().map_err(|e| format!("Configuration error: {}", e))?;
    let back_office = BackOffice::from_config(&config)
        .await
        .map_err(|e| format!("Failed to open back office: {}", e))?;

    match args[0].as_str() {
        "import-comments" => {
            let mut path: Option<PathBuf> = None;
            let mut approve = false;
            for arg in &args[1..] {
                match arg.as_str() {
                    "--yes" => approve = true,
                    other if path.is_none() => path = Some(PathBuf::from(other)),
                    other => return Err(format!("Unexpected argument: {}", other)),
                }
            }
            let path = path.ok_or("import-comments requires a file path")?;
            import_comments(&back_office, path, approve).await
        }
        "export-comments" => {
            let dir = args
                .get(1)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            export_comments(&back_office, dir).await
        }
        "list" => {
            let name = args.get(1).ok_or("list requires a collection name")?;
            let schema = Collection::parse(name)
                .and_then(RecordSchema::for_collection)
                .ok_or_else(|| format!("Not a listable collection: {}", name))?;
            let search = args.get(2).cloned().unwrap_or_default();
            list(&back_office, schema, search).await
        }
        other => {
            print_usage(program);
            Err(format!("Unknown command: {}", other))
        }
    }
}

async fn import_comments(
    back_office: &BackOffice,
    path: PathBuf,
    approve: bool,
) -> Result<(), String> {
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    let mut pipeline = back_office.comment_import();
    let staged = pipeline
        .parse(&bytes)
        .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;

    println!("{} rows staged:", staged.len());
    for row in staged {
        let cell = |field: &str| row.value(field).map(|v| v.to_string()).unwrap_or_default();
        println!(
            "  {:>4}  {:<24} {:>3}  {}",
            row.row,
            cell("name"),
            cell("rating"),
            cell("comment")
        );
    }

    if !approve {
        println!("Preview only; re-run with --yes to write these rows");
        pipeline
            .discard()
            .map_err(|e| format!("Failed to discard preview: {}", e))?;
        return Ok(());
    }

    let mut listing = back_office.comments_listing();
    let report = pipeline
        .approve(&mut listing)
        .await
        .map_err(|e| format!("Import failed: {}", e))?;

    for result in report.failed() {
        if let RowOutcome::Failed { error } = &result.outcome {
            println!("  row {} failed: {}", result.row, error);
        }
    }
    if let Some(e) = &report.refresh_error {
        println!("Listing could not be reloaded: {}", e);
    }
    info!(
        "Imported {} comments ({} failed); listing now shows {}",
        report.created_count(),
        report.failed_count(),
        listing.total()
    );
    Ok(())
}

async fn export_comments(back_office: &BackOffice, dir: PathBuf) -> Result<(), String> {
    let mut listing = back_office.comments_listing();
    listing
        .refresh()
        .await
        .map_err(|e| format!("Failed to load comments: {}", e))?;

    let path = ExportService::export_to_dir(&COMMENT_SCHEMA, listing.committed(), &dir)
        .await
        .map_err(|e| format!("Export failed: {}", e))?;
    println!("Wrote {} comments to {}", listing.total(), path.display());
    Ok(())
}

async fn list(
    back_office: &BackOffice,
    schema: &'static RecordSchema,
    search: String,
) -> Result<(), String> {
    let mut listing = back_office.listing(schema);
    listing
        .set_search(search)
        .await
        .map_err(|e| format!("Failed to load {}: {}", schema.collection, e))?;

    let pages = listing.page().page_count().max(1);
    for page in 1..=pages {
        listing
            .set_page(page)
            .map_err(|e| format!("Invalid page: {}", e))?;
        let current = listing.page();
        for (index, record) in current.rows.iter().enumerate() {
            println!(
                "{:>4}  {:<38} {}",
                current.row_number(index),
                record.id,
                summary(schema, record)
            );
        }
    }
    println!("{} {} total", listing.total(), schema.collection);
    Ok(())
}

/// Search field plus the first other data column
fn summary(schema: &RecordSchema, record: &Record) -> String {
    let mut parts = vec![record
        .get(schema.search_field)
        .map(|v| v.to_string())
        .unwrap_or_default()];
    if let Some(spec) = schema
        .data_fields()
        .find(|f| f.name != schema.search_field)
    {
        if let Some(value) = record.get(spec.name) {
            parts.push(format!("{}={}", spec.name, value));
        }
    }
    parts.join("  ")
}
