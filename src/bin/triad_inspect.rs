use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::path::PathBuf;
use worldsave::{EntityCategory, SavePaths, TriadSummary};

#[derive(Parser)]
#[command(name = "triad-inspect")]
#[command(about = "Summarise the index, type and data files of a world save")]
struct Cli {
    /// Save root containing Mobiles/, Items/ and Guilds/
    #[arg(long, default_value = "Saves")]
    dir: PathBuf,

    /// Print the summaries as JSON
    #[arg(long)]
    json: bool,

    /// List every index record
    #[arg(long)]
    records: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let paths = SavePaths::new(&cli.dir);

    let mut summaries = Vec::new();
    let mut inconsistent = 0usize;
    for category in EntityCategory::ALL {
        let summary = TriadSummary::load(&paths.triad(category), category)
            .with_context(|| format!("failed to read {} triad in {}", category, cli.dir.display()))?;
        if summary.verify().is_err() {
            inconsistent += 1;
        }
        summaries.push(summary);
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        for summary in &summaries {
            print_summary(summary, cli.records);
        }
    }

    if inconsistent > 0 {
        return Err(anyhow!("{} triad(s) failed verification", inconsistent));
    }
    Ok(())
}

fn print_summary(summary: &TriadSummary, records: bool) {
    println!("{}", summary.category);
    println!("  entities:  {}", summary.entity_count());
    println!("  data size: {} bytes", summary.data_len);
    match summary.verify() {
        Ok(()) => println!("  index:     consistent"),
        Err(err) => println!("  index:     {}", err),
    }
    if let Some(types) = &summary.types {
        println!("  types ({}):", types.len());
        for (index, name) in types.iter().enumerate() {
            println!("    [{}] {}", index, name);
        }
    }
    if records {
        for record in &summary.records {
            println!(
                "    {} type={} offset={} length={}",
                record.serial, record.type_ref.0, record.offset, record.length
            );
        }
    }
}
