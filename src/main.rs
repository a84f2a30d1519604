// Inspect a 6502 program through its assembler listing
use anyhow::Context;
use clap::{ArgAction, ArgGroup, Parser};
use std::path::PathBuf;
use trace6502::listing::parse_ranges;
use trace6502::loader::parse_address;
use trace6502::{ImageSpec, LineInfo, ListingSource, Session, SessionConfig, WatchValue};

#[derive(Parser)]
#[command(name = "trace6502")]
#[command(about = "Index a 6502 program's listing against its memory image")]
#[command(version)]
#[command(group(ArgGroup::new("source").required(true).args(["report", "ca65"])))]
struct Cli {
    /// ACME source report (use ACME's -r option)
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// ca65 source listing and ld65 map file
    #[arg(long, num_args = 2, value_names = ["LISTING", "MAP"])]
    ca65: Option<Vec<PathBuf>>,

    /// Load a binary file at an address (decimal, $hex or 0xhex)
    #[arg(short = 'd', long, num_args = 2, value_names = ["PATH", "ADDR"], action = ArgAction::Append)]
    load: Vec<String>,

    /// Load a binary file as read-only memory
    #[arg(long, num_args = 2, value_names = ["PATH", "ADDR"], action = ArgAction::Append)]
    rom: Vec<String>,

    /// PC value on startup (defaults to the listing's, then $0800)
    #[arg(short = 'l', long, value_name = "ADDR")]
    entry: Option<String>,

    /// Cycle ranges to total, e.g. "20-30,loop-done"
    #[arg(short, long, value_name = "QUERY")]
    cycles: Option<String>,

    /// Ceiling for looping step operations
    #[arg(long, value_name = "N")]
    step_limit: Option<u64>,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<SessionConfig> {
        let listing = match (self.report, self.ca65) {
            (Some(report), _) => ListingSource::Acme { report },
            (None, Some(mut files)) => {
                let map = files.pop().context("missing map file")?;
                let listing = files.pop().context("missing listing file")?;
                ListingSource::Ca65 { listing, map }
            }
            (None, None) => anyhow::bail!("specify an ACME report or a ca65 listing and map file"),
        };

        let mut config = SessionConfig::new(listing);
        config.images = images(&self.load, false)?;
        config.images.extend(images(&self.rom, true)?);
        config.entry = self.entry.as_deref().map(parse_address).transpose()?;
        config.step_limit = self.step_limit;

        Ok(config)
    }
}

/// Pairs up `PATH ADDR` values.
fn images(values: &[String], readonly: bool) -> anyhow::Result<Vec<ImageSpec>> {
    values
        .chunks(2)
        .map(|pair| match pair {
            [path, address] => Ok(ImageSpec {
                path: PathBuf::from(path),
                address: parse_address(address)
                    .with_context(|| format!("load address for {}", path))?,
                readonly,
            }),
            _ => anyhow::bail!("expected PATH ADDR pairs"),
        })
        .collect()
}

/// `cost|mark|source`, blank columns where a value is absent.
fn render_line(line: &LineInfo) -> String {
    let cost = line
        .cycle_cost
        .map_or_else(|| " ".to_string(), |cost| cost.to_string());
    let mark = line
        .cycle_mark
        .map_or_else(|| "   ".to_string(), |mark| format!("{:3}", mark));

    format!("{}|{}|{}", cost, mark, line.source_text)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let query = cli.cycles.clone();
    let config = cli.into_config()?;

    for image in &config.images {
        println!(
            "{} file {} at ${:04X}",
            if image.readonly { "ROM" } else { "Data" },
            image.path.display(),
            image.address
        );
    }

    let mut session = Session::open(&config).context("failed to open session")?;
    println!("PC set to ${:04X}", session.entry);

    let listing = &mut session.listing;
    println!(
        "{} lines, {} addresses",
        listing.lines().len(),
        listing.address_index().len()
    );

    for location in listing.watch_locations() {
        println!("{}", WatchValue::read(&session.memory, location));
    }

    if let Some(query) = query {
        let total = parse_ranges(&query, listing.lines())
            .and_then(|ranges| listing.mark_cycle_ranges(&ranges))
            .with_context(|| format!("Don't understand {}", query))?;

        for line in listing.lines().iter().filter(|l| l.cycle_mark.is_some()) {
            println!("{}", render_line(line));
        }
        println!("{} cycles", total);
    }

    Ok(())
}
