use std::{error::Error, fs, path::PathBuf, process::exit};

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use delivery_ledger::{
    CsvLayout, DEFAULT_TIMEZONE, DashboardSummary, DeliveryForm, GasEntryForm, RecordId, Saved,
    SqliteStorage, Store, Trend, format_currency, format_date, format_percentage, import_file,
    today_in,
};

/// Keep track of delivery fees and fuel expenses.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the SQLite database holding the records.
    #[arg(long)]
    db_path: PathBuf,

    /// The canonical timezone used to determine today's date.
    #[arg(long, default_value = DEFAULT_TIMEZONE)]
    timezone: String,

    /// Reject suspicious values instead of warning about them.
    #[arg(long)]
    strict: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show totals, per-weekday figures and trends.
    Summary {
        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List every delivery and fuel expense.
    List,
    /// Record a delivery.
    AddDelivery {
        /// The order number given by the platform.
        #[arg(long)]
        order: String,
        /// The day of the delivery, as YYYY-MM-DD.
        #[arg(long)]
        date: String,
        /// The fee earned. Leave out while the delivery is pending.
        #[arg(long)]
        fee: Option<String>,
        /// Force the status, e.g. "Pendente" for a fee not yet paid out.
        #[arg(long)]
        status: Option<String>,
    },
    /// Record a fuel expense.
    AddGas {
        /// The day of the fill-up, as YYYY-MM-DD.
        #[arg(long)]
        date: String,
        /// The amount paid.
        #[arg(long)]
        amount: String,
        /// A note such as the name of the gas station.
        #[arg(long)]
        description: Option<String>,
    },
    /// Remove a delivery or fuel expense by its ID.
    Remove {
        /// The ID shown by `list`.
        id: String,
    },
    /// Import records from a CSV file.
    Import {
        /// The file to import.
        file: PathBuf,
    },
    /// Export every record to a CSV file.
    Export {
        /// Include IDs, receipt images and descriptions.
        #[arg(long)]
        extended: bool,
        /// The directory to write the file to.
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Report records that were repaired or set aside when loading.
    Check,
}

fn main() {
    setup_logging();

    let args = Args::parse();

    if let Err(error) = run(args) {
        print_error(error);
        exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let storage = SqliteStorage::open(&args.db_path)?;
    let mut store = Store::open(storage)?;
    store.set_strict(args.strict);

    match args.command {
        Command::Summary { json: true } => {
            println!("{}", serde_json::to_string_pretty(&store.summary())?);
        }
        Command::Summary { json: false } => print_summary(&store.summary()),
        Command::List => print_records(&store),
        Command::AddDelivery {
            order,
            date,
            fee,
            status,
        } => {
            let form = DeliveryForm {
                order_number: order,
                date,
                fee,
                status,
                ..Default::default()
            };
            report_saved("delivery", &store.add_delivery(&form)?);
        }
        Command::AddGas {
            date,
            amount,
            description,
        } => {
            let form = GasEntryForm {
                date,
                amount,
                description,
                ..Default::default()
            };
            report_saved("fuel expense", &store.add_gas_entry(&form)?);
        }
        Command::Remove { id } => {
            let id = RecordId::new(&id).ok_or("the ID cannot be empty")?;
            store.remove(&id)?;
            println!("Removed {id}");
        }
        Command::Import { file } => {
            let text = import_file(&file)?;
            let summary = store.import_csv(&text)?;
            println!(
                "Imported {} deliveries and {} fuel expenses from {}",
                summary.deliveries,
                summary.gas_entries,
                file.display()
            );
        }
        Command::Export { extended, out } => {
            let layout = if extended {
                CsvLayout::Extended
            } else {
                CsvLayout::Standard
            };
            let today = today_in(&args.timezone)
                .ok_or_else(|| delivery_ledger::Error::InvalidTimezone(args.timezone.clone()))?;
            let export = store.export_csv(layout, today)?;
            let path = out.join(&export.filename);
            fs::write(&path, export.contents)?;
            println!("Exported records to {}", path.display());
        }
        Command::Check => print_integrity(&store),
    }

    Ok(())
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(stderr_log.with_filter(filter))
        .init();
}

fn report_saved(kind: &str, saved: &Saved) {
    println!("Recorded {kind} {}", saved.id);

    for warning in &saved.warnings {
        print_warning(&warning.message);
    }
}

fn print_summary(summary: &DashboardSummary) {
    let totals = &summary.totals;

    println!("Fees:        {}", format_currency(totals.total_fees));
    println!("Fuel:        {}", format_currency(totals.total_gas));
    println!("Net profit:  {}", format_currency(totals.net_profit));
    println!("Margin:      {}", format_percentage(totals.profit_margin));
    println!(
        "Deliveries:  {} ({} completed, {} pending) over {} days",
        totals.delivery_count, totals.completed_count, totals.pending_count, totals.active_days
    );
    println!("Average fee: {}", format_currency(totals.average_fee));
    println!(
        "Per day:     {:.1} deliveries",
        totals.average_deliveries_per_day
    );

    println!();
    for stat in &summary.weekdays {
        println!(
            "{:<8} {:>4}  {:>14}  avg {}",
            stat.label,
            stat.count,
            format_currency(stat.total_fees),
            format_currency(stat.average_fee)
        );
    }

    match &summary.peak_weekday {
        Some(peak) => println!("Busiest day: {}", peak.label),
        None => println!("Busiest day: N/A"),
    }

    match &summary.best_and_worst {
        Some(days) => {
            println!(
                "Best day:    {} ({})",
                format_date(days.best.date),
                format_currency(days.best.profit)
            );
            println!(
                "Worst day:   {} ({})",
                format_date(days.worst.date),
                format_currency(days.worst.profit)
            );
        }
        None => println!("Best day:    N/A\nWorst day:   N/A"),
    }

    match &summary.trend {
        Trend::Compared(trend) => {
            println!(
                "Fee trend:   {}",
                format_percentage(trend.fees.change_percent)
            );
            println!(
                "Deliveries:  {}",
                format_percentage(trend.delivery_count.change_percent)
            );
            println!(
                "Fuel trend:  {}",
                format_percentage(trend.gas.change_percent)
            );
        }
        Trend::InsufficientData => println!("Trend:       not enough data"),
    }
}

fn print_records<S: delivery_ledger::Storage>(store: &Store<S>) {
    for delivery in store.deliveries() {
        println!(
            "{}  {}  order {:<12} {:>14}  {}",
            delivery.id,
            format_date(delivery.date),
            delivery.order_number,
            delivery.fee.map(format_currency).unwrap_or_default(),
            delivery.status().label()
        );
    }

    for entry in store.gas_entries() {
        println!(
            "{}  {}  fuel  {:>14}  {}",
            entry.id,
            format_date(entry.date),
            format_currency(entry.amount),
            entry.description
        );
    }
}

fn print_integrity<S: delivery_ledger::Storage>(store: &Store<S>) {
    let report = store.integrity_report();

    if report.is_clean() {
        println!("All records loaded without changes.");
        return;
    }

    for repair in &report.repairs {
        println!(
            "Repaired {} of {} in {}: {}",
            repair.field, repair.record_id, repair.collection, repair.description
        );
    }

    for record in &report.unrepairable {
        print_warning(&format!(
            "Set aside record {} of {}: {}",
            record.index, record.collection, record.reason
        ));
    }
}

fn print_warning(message: &str) {
    eprintln!("\x1b[33;1m{}\x1b[0m", capitalise_first_char(message))
}

fn print_error(error: impl ToString) {
    eprintln!(
        "\x1b[31;1m{}\x1b[0m",
        capitalise_first_char(&error.to_string())
    )
}

/// From https://crates.io/crates/capitalize
fn capitalise_first_char(string: &str) -> String {
    let mut chars = string.chars();
    let Some(first) = chars.next() else {
        return String::with_capacity(0);
    };
    first.to_uppercase().chain(chars).collect()
}
