use std::path::PathBuf;

use acdps::OutputFormat;

/// Seed-driven aggregation of census sectors (argument schema only)
#[derive(clap::Parser, Debug)]
#[command(name = "acdps", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v summary, -vv every diagnostic)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Aggregate the sectors of an input directory and write the results
    Run(RunArgs),

    /// Print the effective configuration as JSON
    Config(ConfigArgs),
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum FormatArg {
    Shapefile,
    Geojson,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Shapefile => OutputFormat::Shapefile,
            FormatArg::Geojson => OutputFormat::GeoJson,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Directory holding the seeds, sectors and districts files
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub input: PathBuf,

    /// Output directory, defaults to "."
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// JSON configuration file; flags below override its values
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Output file format
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Units with fewer households are merged into their nearest neighbor
    #[arg(long)]
    pub lower_limit: Option<u64>,

    /// Household count at which a seed stops growing
    #[arg(long)]
    pub limit_to_stop: Option<u64>,

    /// Tolerance over limit-to-stop, in percent
    #[arg(long)]
    pub percent_range: Option<f64>,

    /// Buffer radius increment, in projection units
    #[arg(long)]
    pub buffer_step: Option<f64>,
}

#[derive(clap::Args, Debug)]
pub struct ConfigArgs {
    /// JSON configuration file to merge over the defaults
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,
}
