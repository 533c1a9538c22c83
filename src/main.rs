use std::fs;
use std::path::PathBuf;

use clap::Parser;
use log::info;

use smc::andl;
use smc::bdd::Bdd;
use smc::checker;
use smc::props;
use smc::reach;
use smc::symbolic::SymbolicNet;

#[derive(Debug, Parser)]
#[command(author, version, about = "Symbolic CTL model checker for 1-safe Petri nets")]
struct Cli {
    /// Net description in ANDL format.
    #[arg(value_name = "NET")]
    net: PathBuf,

    /// XML file with CTL properties to check.
    #[arg(value_name = "PROPS")]
    props: Option<PathBuf>,

    /// Write the reachable state set as Graphviz DOT.
    #[clap(long, value_name = "FILE")]
    dot: Option<PathBuf>,

    /// Node table size (in bits, so the actual size is `2^bits` nodes).
    #[clap(long, value_name = "INT", default_value = "20")]
    table_bits: usize,

    /// Increase log verbosity (-v: debug, -vv: trace).
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();

    let level = match args.verbose {
        0 => simplelog::LevelFilter::Info,
        1 => simplelog::LevelFilter::Debug,
        _ => simplelog::LevelFilter::Trace,
    };
    simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let net = andl::parse_net(&fs::read_to_string(&args.net)?)?;
    info!(
        "net '{}': {} places, {} transitions",
        net.name,
        net.num_places(),
        net.num_transitions()
    );

    let bdd = Bdd::new(args.table_bits);
    let model = SymbolicNet::new(&bdd, &net)?;

    let space = reach::explore(&model)?;
    println!(
        "{} reachable markings in {} layers",
        space.count, space.layers
    );

    if let Some(path) = &args.dot {
        fs::write(path, bdd.to_dot(&[space.states])?)?;
        info!("wrote reachable set to {}", path.display());
    }

    if let Some(path) = &args.props {
        let properties = props::parse_properties(&fs::read_to_string(path)?, &net)?;
        info!("checking {} properties", properties.len());

        for verdict in checker::check_properties(&net, &properties, args.table_bits) {
            match verdict.result {
                Ok(true) => println!("{}: TRUE", verdict.id),
                Ok(false) => println!("{}: FALSE", verdict.id),
                Err(e) => println!("{}: ERROR ({})", verdict.id, e),
            }
        }
    }

    info!("total time: {:.3}s", time_total.elapsed().as_secs_f64());
    Ok(())
}
