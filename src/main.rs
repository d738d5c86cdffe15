use clap::{ArgAction, Parser, Subcommand};
use eyre::{Result, WrapErr};
use log::debug;
use rangespec::{RangeSet, Resolver};
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;

/// Operations on range specifications such as `1-5,7,a,b`
#[derive(Parser, Debug)]
#[command(name = "rspec", version, about)]
struct Cli {
    /// Read settings and named sets from this file instead of the default locations
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (may be repeated)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fold range specifications into their canonical form
    Fold {
        /// Range specifications to merge, read from stdin if none are given
        specs: Vec<String>,
        /// Only keep members also in this specification
        #[arg(short, long)]
        intersection: Vec<String>,
        /// Remove members of this specification
        #[arg(short = 'x', long)]
        exclude: Vec<String>,
    },
    /// List the members of a range specification
    Expand {
        spec: String,
        /// Separator between members
        #[arg(short, long, default_value = "\n")]
        separator: String,
        /// Refuse to expand more members than this
        #[arg(short, long)]
        limit: Option<u64>,
    },
    /// Count the members of a range specification
    Count { spec: String },
    /// Members in either specification
    Union { a: String, b: String },
    /// Members in both specifications
    Intersection { a: String, b: String },
    /// Members of A that are not in B
    Difference { a: String, b: String },
    /// Members in exactly one of the specifications
    SymmetricDifference { a: String, b: String },
    /// Check whether every member of A is in B
    Subset { a: String, b: String },
    /// Check whether both specifications have the same members
    Equal { a: String, b: String },
    /// List the named sets from the configuration
    Sets,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let resolver = match &cli.config {
        Some(path) => Resolver::from_path(path)
            .wrap_err_with(|| format!("failed to load {}", path.display()))?,
        None => Resolver::from_config().wrap_err("failed to load configuration")?,
    };

    run(cli.command, &resolver)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(command: Commands, resolver: &Resolver) -> Result<ExitCode> {
    let parse = |spec: &str| parse_resolved(spec, resolver);

    match command {
        Commands::Fold {
            specs,
            intersection,
            exclude,
        } => {
            let specs = if specs.is_empty() {
                debug!("reading range specifications from stdin");
                io::stdin()
                    .lock()
                    .lines()
                    .collect::<Result<Vec<_>, _>>()
                    .wrap_err("failed to read stdin")?
            } else {
                specs
            };

            println!("{}", fold(&specs, &intersection, &exclude, resolver)?);
        }
        Commands::Expand {
            spec,
            separator,
            limit,
        } => {
            let members = parse(&spec)?.try_expand(limit.unwrap_or(resolver.expand_limit()))?;
            if !members.is_empty() {
                println!("{}", members.join(&separator));
            }
        }
        Commands::Count { spec } => {
            println!("{}", parse(&spec)?.len());
        }
        Commands::Union { a, b } => {
            println!("{}", parse(&a)?.union(&parse(&b)?));
        }
        Commands::Intersection { a, b } => {
            println!("{}", parse(&a)?.intersection(&parse(&b)?));
        }
        Commands::Difference { a, b } => {
            println!("{}", parse(&a)?.difference(&parse(&b)?));
        }
        Commands::SymmetricDifference { a, b } => {
            println!("{}", parse(&a)?.symmetric_difference(&parse(&b)?));
        }
        Commands::Subset { a, b } => {
            return Ok(report(parse(&a)?.is_subset(&parse(&b)?)));
        }
        Commands::Equal { a, b } => {
            return Ok(report(parse(&a)? == parse(&b)?));
        }
        Commands::Sets => {
            for (name, spec) in resolver.sets() {
                println!("@{name}: {spec}");
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn parse_resolved(spec: &str, resolver: &Resolver) -> Result<RangeSet> {
    let spec = resolver.resolve_references(spec)?;
    Ok(rangespec::parse(&spec))
}

/// Union of `specs`, intersected with every `intersection` and minus every
/// `exclude`
fn fold(
    specs: &[String],
    intersection: &[String],
    exclude: &[String],
    resolver: &Resolver,
) -> Result<RangeSet> {
    let mut set = RangeSet::new();
    for spec in specs {
        set = set.union(&parse_resolved(spec, resolver)?);
    }
    for spec in intersection {
        set = set.intersection(&parse_resolved(spec, resolver)?);
    }
    for spec in exclude {
        set = set.difference(&parse_resolved(spec, resolver)?);
    }

    Ok(set)
}

fn report(result: bool) -> ExitCode {
    println!("{result}");
    if result {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
