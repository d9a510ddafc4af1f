use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use pretty_print_nalgebra::*;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use latingen::storage::{save_versions, ExperimentSource, JsonDirectorySink, JsonFileSource, DEFAULT_PREFIX};
use latingen::{counterbalance, counterbalance_cyclic, LatinSquare, LatinSquareGeneratorBuilder, RandomType};

/// Generate Latin-square counterbalanced versions of an experiment structure
#[derive(Parser, Debug)]
#[command(name = "latingen")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Experiment definition (JSON array of blocks)
    input: PathBuf,

    /// Directory the versions are written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// File name prefix, followed by the 1-based version number
    #[arg(long, default_value = DEFAULT_PREFIX)]
    prefix: String,

    /// Number of Latin squares to search for (each yields N versions)
    #[arg(short = 'n', long, default_value_t = 1)]
    squares: usize,

    /// Maximum number of mutation attempts
    #[arg(short = 'i', long, default_value_t = 1000)]
    max_iterations: usize,

    /// Seed for a repeatable search
    #[arg(short, long)]
    seed: Option<u64>,

    /// Do not collect a square that was already collected
    #[arg(long)]
    distinct: bool,

    /// Use the cyclic square directly instead of searching
    #[arg(long, conflicts_with_all = ["squares", "max_iterations", "seed", "distinct"])]
    cyclic: bool,

    /// Print the squares used
    #[arg(long)]
    print_squares: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();
    debug!(?args, "starting");

    let definition = JsonFileSource::new(&args.input).load_experiment()?;

    let (versions, squares) = if args.cyclic {
        let n = definition.trial_count()?;
        (counterbalance_cyclic(&definition)?, vec![LatinSquare::cyclic(n)])
    } else {
        let random_type = args.seed.map_or(RandomType::Uniform, RandomType::Seeded);
        let mut generator = LatinSquareGeneratorBuilder::default();
        generator
            .max_iterations(args.max_iterations)
            .target_count(args.squares)
            .random_type(random_type)
            .distinct(args.distinct);
        let (versions, result) = counterbalance(&definition, &mut generator, |iteration, found| {
            debug!(iteration, found, "square accepted");
        })?;
        (versions, result.squares)
    };

    if args.print_squares {
        for (i, square) in squares.iter().enumerate() {
            println!("square {}: {}", i + 1, pretty_print!(square.cells()));
        }
    }

    let sink = JsonDirectorySink::with_prefix(&args.output_dir, args.prefix.as_str());
    let paths = save_versions(&sink, &versions)?;

    println!("Files saved to the following paths:");
    for path in paths {
        println!("{}", path.display());
    }
    Ok(())
}
