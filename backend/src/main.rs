//! BOM summary CLI - classify parts lists and total them per item
//!
//! # Main Commands
//!
//! ```bash
//! bomsummary convert parts.xlsx -o summary.csv   # Per-item summary
//! bomsummary serve                               # Start HTTP server (port 3000)
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! bomsummary parse parts.xlsx        # Normalized rows as JSON
//! bomsummary classify parts.xlsx     # Per-group decisions as JSON
//! bomsummary layout                  # Summary sheet coordinates
//! ```

use clap::{Args, Parser, Subcommand};
use bomsummary::api::logs::LOG_BROADCASTER;
use bomsummary::writer::column_letter;
use bomsummary::{
    convert_file, load_file, write_summary_csv, write_summary_csv_file, write_summary_json_file, Category,
    ConversionResult, ConvertOptions, SheetLayout,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "bomsummary")]
#[command(about = "Classify BOM part groups by design stage and summarise them per item", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Input selection shared by the reading commands.
#[derive(Args)]
struct SourceArgs {
    /// Input workbook (.xlsx/.xls) or CSV file
    input: PathBuf,

    /// JSON options file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Worksheet name (default: 組立部品リスト, else the first sheet)
    #[arg(long)]
    sheet: Option<String>,

    /// 0-based header row (auto-detect if not specified)
    #[arg(long)]
    header_row: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Full conversion: sheet → per-item category summary
    Convert {
        #[command(flatten)]
        source: SourceArgs,

        /// CSV output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write validated JSON
        #[arg(long)]
        json: Option<PathBuf>,

        /// Order name printed on every row
        #[arg(long)]
        order_name: Option<String>,

        /// Order number printed on every row
        #[arg(long)]
        order_number: Option<String>,

        /// Print the per-group decision table to stderr
        #[arg(long)]
        explain: bool,

        /// Do not echo progress logs
        #[arg(short, long)]
        quiet: bool,
    },

    /// Read a sheet and output normalized rows as JSON
    Parse {
        #[command(flatten)]
        source: SourceArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Output every part group with the rule that placed it
    Classify {
        #[command(flatten)]
        source: SourceArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the summary sheet layout
    Layout,

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// JSON options file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            source,
            output,
            json,
            order_name,
            order_number,
            explain,
            quiet,
        } => {
            // stdout carries the CSV
            LOG_BROADCASTER.set_quiet(quiet || output.is_none());
            load_options(&source).and_then(|mut options| {
                if let Some(name) = order_name {
                    options.order_name = name;
                }
                if let Some(number) = order_number {
                    options.order_number = number;
                }
                options.explain = explain;
                cmd_convert(&source.input, &options, output.as_deref(), json.as_deref())
            })
        }

        Commands::Parse { source, output } => {
            LOG_BROADCASTER.set_quiet(output.is_none());
            load_options(&source).and_then(|options| cmd_parse(&source.input, &options, output.as_deref()))
        }

        Commands::Classify { source, output } => {
            LOG_BROADCASTER.set_quiet(output.is_none());
            load_options(&source).and_then(|mut options| {
                options.explain = true;
                cmd_classify(&source.input, &options, output.as_deref())
            })
        }

        Commands::Layout => cmd_layout(),

        Commands::Serve { port, config } => match ConvertOptions::load(config.as_deref()) {
            Ok(options) => bomsummary::server::start_server(port, options).await,
            Err(e) => Err(e.into()),
        },
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

/// Defaults < config file < environment < flags.
fn load_options(source: &SourceArgs) -> Result<ConvertOptions, Box<dyn std::error::Error>> {
    let mut options = ConvertOptions::load(source.config.as_deref())?;
    if let Some(ref sheet) = source.sheet {
        options.sheet_name = Some(sheet.clone());
    }
    if source.header_row.is_some() {
        options.header_row = source.header_row;
    }
    Ok(options)
}

fn cmd_convert(
    input: &Path,
    options: &ConvertOptions,
    output: Option<&Path>,
    json_output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = convert_file(input, options)?;

    if options.explain {
        print_decisions(&result);
    }
    print_stats(&result);

    match output {
        Some(path) => {
            write_summary_csv_file(path, &result.summaries)?;
            eprintln!("💾 Summary written to: {}", path.display());
        }
        None => write_summary_csv(std::io::stdout().lock(), &result.summaries)?,
    }

    if let Some(path) = json_output {
        write_summary_json_file(path, &result.summaries)?;
        eprintln!("💾 JSON written to: {}", path.display());
    }

    Ok(())
}

fn cmd_parse(input: &Path, options: &ConvertOptions, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing: {}", input.display());

    let loaded = load_file(input, options)?;
    eprintln!("   Header row: {}", loaded.source.header_row);
    eprintln!("   Columns: {}", loaded.source.headers.join(", "));
    eprintln!("✅ Parsed {} rows", loaded.rows.len());

    let json = serde_json::to_string_pretty(&loaded.rows)?;
    write_output(&json, output)
}

fn cmd_classify(input: &Path, options: &ConvertOptions, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let result = convert_file(input, options)?;
    print_stats(&result);

    let json = serde_json::to_string_pretty(&result.decisions)?;
    write_output(&json, output)
}

fn cmd_layout() -> Result<(), Box<dyn std::error::Error>> {
    println!("Header rows: {} (categories), {} (部品数 / 重量)", SheetLayout::TITLE_ROW, SheetLayout::SUB_HEADER_ROW);
    println!("Data rows: {} onwards", SheetLayout::data_row(0));
    println!(
        "Columns: A-{} (identification fill #{}, last {})",
        column_letter(SheetLayout::CATEGORY_BLOCKS[0].start_column - 1),
        SheetLayout::BASE_FILL,
        column_letter(SheetLayout::last_column())
    );
    println!();
    for (label, column) in SheetLayout::ITEM_FIELDS {
        println!("  {:<8} {:>3}  {}", label, column, column_letter(column));
    }
    println!();
    for category in Category::ALL {
        let block = SheetLayout::block(category);
        println!(
            "  {:<3} 部品数 {:<3} 重量 {:<3} fill #{}  {}",
            category.code(),
            column_letter(block.count_column()),
            column_letter(block.mass_column()),
            block.fill,
            category.description()
        );
    }
    Ok(())
}

fn print_stats(result: &ConversionResult) {
    let stats = &result.stats;
    eprintln!("\n📊 Rows: {} ({} skipped)", stats.rows_read, stats.rows_skipped);
    eprintln!("   Items: {}, part groups: {}", stats.items, stats.part_groups);
    eprintln!("   Excluded: {}, split Dm/De: {}", stats.excluded, stats.unresolved);
    for category in Category::ALL {
        let totals = stats.totals.get(category);
        eprintln!("   {:<3} {:>6} {:>14.2}", category.code(), totals.count, totals.mass);
    }
    if stats.group_failures > 0 || stats.item_failures > 0 {
        eprintln!("   ⚠️  {} group failures, {} items skipped", stats.group_failures, stats.item_failures);
    }
}

fn print_decisions(result: &ConversionResult) {
    eprintln!("\n{:<8} {:<12} {:<10} {:>12}  {:<5} {}", "ITEM", "SERIAL", "PARTS", "MASS", "STEP", "RESULT");
    for d in &result.decisions {
        let outcome = match (d.category, d.excluded) {
            (_, true) => "excluded".to_string(),
            (Some(c), _) if d.allocated => format!("{} (split)", c),
            (Some(c), _) => c.to_string(),
            (None, false) => "-".to_string(),
        };
        let step = d.step.map(|s| s.to_string()).unwrap_or_else(|| "err".to_string());
        eprintln!(
            "{:<8} {:<12} {:<10} {:>12.2}  {:<5} {}",
            d.item_id, d.serial_id, d.parts_id, d.mass, step, outcome
        );
    }
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
