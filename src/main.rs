//! pfc-balance CLI: run one PFC search against a CSV catalog.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use pfc_balance::catalog::ItemCatalog;
use pfc_balance::jobs::{JobRegistry, JobStatus};
use pfc_balance::search::{ItemRequest, PfcTriple, SearchConfig};

fn usage(program: &str) -> ! {
    eprintln!("Usage: {program} <catalog.csv> <protein> <fat> <carbs> <item=max>... [--seed N]");
    eprintln!("       {program} <catalog.csv> --search <query>");
    eprintln!();
    eprintln!("Recommend item quantities whose PFC totals approach the target.");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  catalog.csv  food_name,protein,fat,carbohydrate,unit table");
    eprintln!("  item=max     item name and its maximum quantity");
    eprintln!("  --seed N     fixed random seed for reproducible output");
    eprintln!("  --search Q   list catalog items whose name contains Q");
    process::exit(1);
}

fn parse_number(program: &str, what: &str, raw: &str) -> f64 {
    raw.parse().unwrap_or_else(|_| {
        eprintln!("Invalid {what}: {raw}");
        usage(program)
    })
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("pfc-balance");
    if args.len() < 3 {
        usage(program);
    }

    let catalog_path = PathBuf::from(&args[1]);
    let catalog = ItemCatalog::from_path(&catalog_path).unwrap_or_else(|e| {
        eprintln!("Error loading {}: {e}", catalog_path.display());
        process::exit(1);
    });

    if args[2] == "--search" {
        let query = args.get(3).map(String::as_str).unwrap_or("");
        for name in catalog.search(query) {
            println!("{name}");
        }
        return;
    }

    if args.len() < 6 {
        usage(program);
    }
    let target = PfcTriple::new(
        parse_number(program, "protein target", &args[2]),
        parse_number(program, "fat target", &args[3]),
        parse_number(program, "carbs target", &args[4]),
    );

    let mut config = SearchConfig::default();
    let mut requests = Vec::new();
    let mut rest = args[5..].iter();
    while let Some(arg) = rest.next() {
        if arg == "--seed" {
            let raw = rest.next().unwrap_or_else(|| usage(program));
            let seed = raw.parse().unwrap_or_else(|_| usage(program));
            config = config.with_seed(seed);
            continue;
        }
        let Some((name, max)) = arg.rsplit_once('=') else {
            eprintln!("Expected item=max, got {arg}");
            usage(program);
        };
        requests.push(ItemRequest::new(name, parse_number(program, "maximum", max)));
    }

    let registry = JobRegistry::new(Arc::new(catalog), config).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        process::exit(1);
    });
    let id = registry.submit(&requests, target).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        process::exit(1);
    });

    let mut last_percent = None;
    let record = loop {
        let record = registry.poll(id).unwrap_or_else(|e| {
            eprintln!("Error: {e}");
            process::exit(1);
        });
        if last_percent != Some(record.percent_complete) {
            eprintln!("[{:>3}%] {}", record.percent_complete, record.status_text);
            last_percent = Some(record.percent_complete);
        }
        if record.status.is_finished() {
            break record;
        }
        thread::sleep(Duration::from_millis(200));
    };

    if record.status == JobStatus::Failed {
        eprintln!("Search failed: {}", record.status_text);
        process::exit(1);
    }
    match record.result.as_ref().and_then(|r| r.best()) {
        Some(best) => println!("{best}"),
        None => println!("No recommendation found."),
    }
}
