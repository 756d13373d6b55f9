use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

// Import from sheetmap-core
use sheetmap_core::{MappingConfig, OutputFormat, ProcessOptions, SheetProcessor, TraceConfig};

// Import CLI utilities
use sheetmap_cli::{append_rule, describe_rules, RuleDraft};

#[derive(Parser)]
#[command(name = "sheetmap")]
#[command(about = "Extract anchored tables from spreadsheets into JSON using mapping rules")]
struct Cli {
    /// Raise log level to debug (RUST_LOG still wins when set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply a rule file to a workbook and write the extracted JSON
    Extract(ExtractArgs),
    /// Check a rule file and report every malformed rule
    Validate {
        /// Rule file (JSON or YAML)
        #[arg(short, long)]
        rules: PathBuf,
    },
    /// Append a rule to a rule file, creating the file if needed
    AddRule(AddRuleArgs),
    /// List the rules in a rule file
    ShowRules {
        /// Rule file (JSON or YAML)
        #[arg(short, long)]
        rules: PathBuf,
    },
}

#[derive(Args)]
struct ExtractArgs {
    /// Rule file (JSON or YAML)
    #[arg(short, long)]
    rules: PathBuf,

    /// Workbook to read (defaults to the rule file's excel_file)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Sheet name (defaults to the rule file's sheet, then the first sheet)
    #[arg(short, long)]
    sheet: Option<String>,

    /// Output file path
    #[arg(short, long, default_value = "extracted_output.json")]
    output: PathBuf,

    /// Output format: pretty or compact
    #[arg(short = 'f', long, default_value = "pretty")]
    format: OutputFormat,

    /// Directory for cached extraction results
    #[arg(long, default_value = "cache")]
    cache_dir: PathBuf,

    /// Skip cache and force fresh processing (useful for development/testing)
    #[arg(long)]
    skip_cache: bool,

    /// Disable the cache entirely (no cache directory is created)
    #[arg(long)]
    no_cache: bool,

    /// Enable detailed profiling of all processing steps
    #[arg(long)]
    profile: bool,

    /// Log extracted rows for sections matching this pattern (repeatable).
    /// Tracing always runs the rules, so the cache is bypassed.
    #[arg(long = "trace-section")]
    trace_sections: Vec<String>,
}

#[derive(Args)]
struct AddRuleArgs {
    /// Rule file to append to
    #[arg(short, long)]
    rules: PathBuf,

    /// Output section name
    #[arg(long)]
    section: String,

    /// Anchor keyword; omit to add a disabled rule
    #[arg(long = "from")]
    keyword: Option<String>,

    /// Rows to skip from the anchor (block) or below the anchor row (until)
    #[arg(long, allow_hyphen_values = true)]
    skip_rows: Option<i64>,

    /// Columns to skip from the anchor
    #[arg(long, allow_hyphen_values = true)]
    skip_cols: Option<isize>,

    /// Extraction start row, relative to the skipped position
    #[arg(long, allow_hyphen_values = true)]
    start_rows: Option<isize>,

    /// Extraction start column, relative to the skipped position
    #[arg(long, allow_hyphen_values = true)]
    start_cols: Option<isize>,

    /// Last column read, relative to the skipped position
    #[arg(long, allow_hyphen_values = true)]
    stop_col: Option<isize>,

    /// Extract at every anchor instead of only the first
    #[arg(long = "loop")]
    repeat: bool,

    /// Read whole rows below the anchor until a stop keyword
    #[arg(long)]
    until: bool,

    /// Stop keyword for until rules
    #[arg(long)]
    stop_before: Option<String>,

    /// Record this workbook in the rule file
    #[arg(long)]
    excel_file: Option<PathBuf>,
}

impl From<&AddRuleArgs> for RuleDraft {
    fn from(args: &AddRuleArgs) -> Self {
        RuleDraft {
            section: args.section.clone(),
            keyword: args.keyword.clone(),
            skip_rows: args.skip_rows,
            skip_cols: args.skip_cols,
            start_rows: args.start_rows,
            start_cols: args.start_cols,
            stop_col: args.stop_col,
            repeat: args.repeat,
            until: args.until,
            stop_before: args.stop_before.clone(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    println!("🦀 Sheetmap Extractor");

    let result = match &cli.command {
        Command::Extract(args) => run_extract(args),
        Command::Validate { rules } => run_validate(rules),
        Command::AddRule(args) => run_add_rule(args),
        Command::ShowRules { rules } => run_show_rules(rules),
    };

    if let Err(e) = result {
        eprintln!("❌ {e:#}");
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn load_rules(path: &Path) -> Result<MappingConfig> {
    let config = MappingConfig::load_from_file(path)?;
    println!("📋 Loaded {} rules from: {}", config.rules.len(), path.display());
    Ok(config)
}

fn run_extract(args: &ExtractArgs) -> Result<()> {
    let config = load_rules(&args.rules)?;

    let input = args
        .input
        .clone()
        .or_else(|| config.workbook.clone())
        .ok_or_else(|| {
            anyhow!("No workbook given: pass --input or set excel_file in the rule file")
        })?;

    let mut processor = if args.no_cache {
        SheetProcessor::new()
    } else {
        SheetProcessor::new_with_cache(&args.cache_dir)?
    };
    if !args.trace_sections.is_empty() {
        processor.set_trace_config(TraceConfig::new(true, args.trace_sections.clone()));
    }

    let options = ProcessOptions {
        sheet: args.sheet.clone(),
        skip_cache: args.skip_cache,
        profile: args.profile,
    };

    debug!(?options, cache_dir = %args.cache_dir.display(), "Extract options");
    println!("📄 Processing: {}", input.display());
    let outcome = processor.process(&input, &config, &options)?;

    if outcome.cache_hit {
        println!("🎯 Served from cache (per-rule statistics need --skip-cache)");
    } else {
        println!("✅ Successfully extracted workbook");
    }
    println!("📊 Extraction metrics:");
    println!("   - Sections: {}", outcome.output.len());
    println!("   - Rows: {}", outcome.output.total_rows());
    for report in &outcome.reports {
        println!(
            "   - {}: {} anchors, {} blocks, {} rows",
            report.section, report.anchors_found, report.blocks, report.rows
        );
    }

    outcome.output.save_with_format(&args.output, args.format)?;
    println!("💾 Results saved to: {}", args.output.display());

    Ok(())
}

fn run_validate(rules: &Path) -> Result<()> {
    let config = load_rules(rules)?;
    let (compiled, report) = config.check();

    for warning in &report.warnings {
        println!("⚠️  {warning}");
    }

    if report.is_valid() {
        println!("✅ All {} rules are valid", compiled.len());
        Ok(())
    } else {
        println!("{report}");
        Err(anyhow!("Rule file {} is malformed", rules.display()))
    }
}

fn run_add_rule(args: &AddRuleArgs) -> Result<()> {
    let draft = RuleDraft::from(args);
    let (config, rule) = append_rule(&args.rules, &draft, args.excel_file.as_deref())?;

    println!("➕ Added rule: {rule}");
    println!(
        "💾 {} now holds {} rules",
        args.rules.display(),
        config.rules.len()
    );
    Ok(())
}

fn run_show_rules(rules: &Path) -> Result<()> {
    let config = load_rules(rules)?;

    if let Some(workbook) = &config.workbook {
        println!("📁 Workbook: {}", workbook.display());
    }
    if let Some(sheet) = &config.sheet {
        println!("📑 Sheet: {sheet}");
    }
    for line in describe_rules(&config) {
        println!("{line}");
    }
    Ok(())
}
