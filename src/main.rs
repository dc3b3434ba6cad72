use std::error::Error;

use clap::Parser;
use livemap_parser::{
    Livemap, TrainClass, TraininfoClient, format_report, parse_timetable_document,
};

/// Decode a live map snapshot and report the delays of a matching train.
#[derive(Parser)]
struct Args {
    /// Comma-separated train classes: labels (IC, ICL, regional, other, S)
    /// or raw bit values.
    #[clap(short, long)]
    classes: Option<String>,
    /// Keep only trains whose name contains this whole token (e.g. a train
    /// number).
    #[clap(short, long)]
    number: Option<String>,
    /// Path to a downloaded live map snapshot.
    filename: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Warn)
        .env()
        .init()?;

    let args = Args::parse();
    // A bad filter token must surface before any decode or fetch work.
    let classes = match &args.classes {
        Some(raw) => TrainClass::parse_filter(raw)?,
        None => TrainClass::default_filter(),
    };

    let livemap = Livemap::from_file(&args.filename)?;
    let trains: Vec<_> = livemap.matching(&classes, args.number.as_deref()).collect();

    for train in &trains {
        println!("{} towards {}", train.name(), train.lstopname());
        println!(
            "Travelling from {} to {}",
            train.prevstop(),
            train.nextstop()
        );
        println!("Position: {} {}", train.x(), train.y());
        println!();
    }

    // The live info lookup only makes sense for an unambiguous match.
    if let [train] = trains.as_slice() {
        let client = TraininfoClient::new()?;
        let page = client.fetch_timetable_page(train).await?;
        let entries = parse_timetable_document(&page).collect::<Result<Vec<_>, _>>()?;
        for line in format_report(entries) {
            println!("{line}");
        }
    }

    Ok(())
}
