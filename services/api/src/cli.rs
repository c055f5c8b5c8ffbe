use crate::infra::load_audit_config;
use crate::server;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use ticket_audit::audit::{AuditEngine, ReferenceData, RuleId, TicketBatch, VerdictTable};
use ticket_audit::config::AppConfig;
use ticket_audit::error::AppError;
use ticket_audit::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "ticket-audit",
    about = "Audit support-ticket exports against configurable quality rules",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Audit a ticket export and write the verdict table
    Audit(AuditArgs),
    /// List the available rules in evaluation order
    Rules,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct AuditArgs {
    /// Ticket export to audit (.csv, or .json holding an array of objects)
    #[arg(long)]
    pub(crate) tickets: PathBuf,
    /// JSON audit configuration (defaults to AUDIT_CONFIG, else every rule)
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,
    /// Comma-separated rule ids or display names; replaces the configured selection
    #[arg(long)]
    pub(crate) rules: Option<String>,
    /// Tower mapping table (defaults to AUDIT_TOWER_MAP)
    #[arg(long)]
    pub(crate) tower_map: Option<PathBuf>,
    /// Category mapping table (defaults to AUDIT_CATEGORY_MAP)
    #[arg(long)]
    pub(crate) category_map: Option<PathBuf>,
    /// Output format for the verdict table
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub(crate) format: OutputFormat,
    /// Write the verdict table here instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Csv,
    Json,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Audit(args) => run_audit(args),
        Command::Rules => {
            print_rules();
            Ok(())
        }
    }
}

fn run_audit(args: AuditArgs) -> Result<(), AppError> {
    let AuditArgs {
        tickets,
        config,
        rules,
        tower_map,
        category_map,
        format,
        output,
    } = args;

    let app_config = AppConfig::load()?;
    telemetry::init(&app_config.telemetry)?;

    let config_path = config.or(app_config.audit.rules_config);
    let mut audit_config = load_audit_config(config_path.as_deref())?;
    if let Some(rules) = rules {
        audit_config.select_rules(&rules)?;
    }

    let tower_map = tower_map.unwrap_or(app_config.audit.tower_map);
    let category_map = category_map.unwrap_or(app_config.audit.category_map);
    let reference = ReferenceData::load(&tower_map, &category_map);

    let batch = read_batch(&tickets)?;
    let table = AuditEngine::new(audit_config, reference).run(&batch);

    match output {
        Some(path) => write_table(&table, format, File::create(path)?),
        None => write_table(&table, format, io::stdout().lock()),
    }
}

fn read_batch(path: &Path) -> Result<TicketBatch, AppError> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        let file = File::open(path)?;
        Ok(TicketBatch::from_json_reader(BufReader::new(file))?)
    } else {
        Ok(TicketBatch::from_csv_path(path)?)
    }
}

fn write_table<W: Write>(table: &VerdictTable, format: OutputFormat, mut writer: W) -> Result<(), AppError> {
    match format {
        OutputFormat::Csv => table.write_csv(writer).map_err(io::Error::from)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, table).map_err(io::Error::from)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

fn print_rules() {
    println!("{:<36} {:<7} Name", "Id", "Scored");
    for rule in RuleId::ALL {
        let scored = if rule.is_scored() { "yes" } else { "no" };
        println!("{:<36} {:<7} {}", rule.as_str(), scored, rule.display_name());
    }
}
