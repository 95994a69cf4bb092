use clap::Parser;
use fusbench::commands::{classify, compare, names, stats};
use fusbench::config::ComparisonConfig;
use std::fs::File;
use std::io::{self, BufWriter, Write};

/// Common options shared between all commands
#[derive(Parser, Debug)]
struct CommonOpts {
    /// Breakpoint tolerance in bp (0 = exact matching only). Each breakpoint is
    /// widened by half the window on either side.
    #[clap(short = 'w', long, value_parser, default_value_t = 0)]
    window: u32,

    /// Compare breakpoints and fusion names as written instead of lexically sorted
    #[clap(long, action)]
    unsorted: bool,

    /// Keep only predictions supported by more than this many reads
    #[clap(short = 'l', long, value_parser, default_value_t = 0.0)]
    lower_threshold: f64,

    /// Drop predictions supported by more than this many reads
    #[clap(short = 'u', long, value_parser)]
    upper_threshold: Option<f64>,

    /// Write the output table here instead of stdout
    #[clap(short = 'o', long, value_parser)]
    output: Option<String>,

    /// Verbosity level (0 = error, 1 = info, 2 = debug)
    #[clap(short, long, default_value = "0")]
    verbose: u8,
}

impl CommonOpts {
    fn config(&self) -> ComparisonConfig {
        ComparisonConfig {
            window: self.window,
            sorted: !self.unsorted,
            lower_threshold: self.lower_threshold,
            upper_threshold: self.upper_threshold,
        }
    }
}

/// Benchmark fusion-transcript callers against a truth set.
#[derive(Parser, Debug)]
#[command(author, version, about, disable_help_subcommand = true)]
enum Args {
    /// Classify each prediction as TP/FP and each missed truth fusion as FN, per tool
    Classify {
        #[clap(flatten)]
        common: CommonOpts,

        /// Truth table (fusion_name, breakpoint, num_reads)
        #[clap(short = 't', long, value_parser)]
        truth_fusions: String,

        /// Prediction table (fusion, breakpoint, num_reads, prog, sample) of one sample
        #[clap(short = 'p', long, value_parser)]
        pred_fusions: String,
    },
    /// Reconcile truth and predicted breakpoints, exactly and within the window
    Compare {
        #[clap(flatten)]
        common: CommonOpts,

        /// Truth table
        #[clap(short = 't', long, value_parser)]
        truth_fusions: String,

        /// Prediction table
        #[clap(short = 'p', long, value_parser)]
        pred_fusions: String,

        /// Restrict predictions to this tool (all tools pooled when omitted)
        #[clap(long, value_parser)]
        prog: Option<String>,
    },
    /// Reconcile fusion names, letting paralogs of either partner gene match
    Names {
        #[clap(flatten)]
        common: CommonOpts,

        /// Truth table
        #[clap(short = 't', long, value_parser)]
        truth_fusions: String,

        /// Prediction table
        #[clap(short = 'p', long, value_parser)]
        pred_fusions: String,

        /// Paralog clusters, one whitespace-separated cluster per line
        #[clap(long, value_parser)]
        paralogs: Option<String>,
    },
    /// Print per-chromosome breakpoint index sizes of a truth or prediction table
    Stats {
        #[clap(flatten)]
        common: CommonOpts,

        /// Table with a `breakpoint` column
        #[clap(short = 'b', long, value_parser)]
        breakpoints: String,
    },
}

fn init_logger(common: &CommonOpts) {
    env_logger::Builder::new()
        .filter_level(match common.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();
}

fn open_output(common: &CommonOpts) -> io::Result<Box<dyn Write>> {
    match &common.output {
        Some(path) => Ok(Box::new(BufWriter::new(File::create(path)?))),
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    match args {
        Args::Classify {
            common,
            truth_fusions,
            pred_fusions,
        } => {
            init_logger(&common);
            classify::run_classify(
                &truth_fusions,
                &pred_fusions,
                &common.config(),
                open_output(&common)?,
            )?;
        }
        Args::Compare {
            common,
            truth_fusions,
            pred_fusions,
            prog,
        } => {
            init_logger(&common);
            compare::run_compare(
                &truth_fusions,
                &pred_fusions,
                prog.as_deref(),
                &common.config(),
                open_output(&common)?,
            )?;
        }
        Args::Names {
            common,
            truth_fusions,
            pred_fusions,
            paralogs,
        } => {
            init_logger(&common);
            names::run_names(
                &truth_fusions,
                &pred_fusions,
                paralogs.as_deref(),
                &common.config(),
                open_output(&common)?,
            )?;
        }
        Args::Stats {
            common,
            breakpoints,
        } => {
            init_logger(&common);
            stats::run_stats(&breakpoints, common.window, open_output(&common)?)?;
        }
    }

    Ok(())
}
