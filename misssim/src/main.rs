use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use std::time::Instant;
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::{debug, info};
use misslib::classifier::{classify_stream, LabelLine};
use misslib::config::CacheSpec;
use misslib::document::Format;
use misslib::io::{get_reader, write_variants};
use misslib::variant::derive;

#[derive(Parser, Debug)]
#[command(about = String::from("Classify cache misses as compulsory, capacity, mapping, or replacement"))]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log more detail to stderr, repeat for more
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Derive the capacity, associative, and real configurations from a cache specification
    Derive {
        /// Cache specification file, or - for stdin
        spec: String,

        /// Directory to write the configurations to, defaults to temporary files
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = DocumentFormat::Xml)]
        format: DocumentFormat,
    },
    /// Label each reference of a stream with the cause of its miss
    Classify {
        /// Reference stream: one "address capacity associative real" record per line, or - for stdin
        #[arg(default_value = "-")]
        input: String,

        /// Block size of the cache, in bytes. Must match the specification the variants came from
        #[arg(short, long)]
        block_size: NonZeroU64,

        /// The miss level indicator that represents an actual miss
        #[arg(short, long, allow_negative_numbers = true)]
        miss_level: i64,

        /// Print the miss counts instead of a label per reference
        #[arg(short, long)]
        summary: bool,

        /// Print the summary as JSON
        #[arg(short, long, requires = "summary")]
        json: bool,
    },
}

#[derive(ValueEnum, Copy, Clone, Debug)]
enum DocumentFormat {
    Xml,
    Json,
}

impl From<DocumentFormat> for Format {
    fn from(value: DocumentFormat) -> Self {
        match value {
            DocumentFormat::Xml => Format::Xml,
            DocumentFormat::Json => Format::Json,
        }
    }
}

fn main() -> Result<(), String> {
    let args = Args::parse();
    let level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };
    env_logger::init_from_env(Env::default().filter_or("MISSSIM_LOG", level));
    debug!("Parsed arguments: {args:?}");

    match args.command {
        Command::Derive { spec, out_dir, format } => run_derive(&spec, out_dir.as_deref(), format.into()),
        Command::Classify {
            input,
            block_size,
            miss_level,
            summary,
            json,
        } => run_classify(&input, block_size, miss_level, summary, json),
    }
}

fn run_derive(spec_path: &str, out_dir: Option<&Path>, format: Format) -> Result<(), String> {
    let spec = if spec_path == "-" {
        CacheSpec::from_reader(io::stdin().lock())
    } else {
        let spec_file = File::open(spec_path).map_err(|e| format!("Couldn't open the specification file at path {spec_path}: {e}"))?;
        CacheSpec::from_reader(BufReader::new(spec_file))
    }
    .map_err(|e| format!("fatal error: {e}"))?;
    let variants = derive(&spec).map_err(|e| format!("fatal error: {e}"))?;
    let files = write_variants(&variants, out_dir, format).map_err(|e| format!("Couldn't write the cache configurations: {e}"))?;
    // Consumed by the calling script, which runs the simulations and cleans up
    println!("{files}");
    Ok(())
}

fn run_classify(input: &str, block_size: NonZeroU64, miss_level: i64, summary: bool, json: bool) -> Result<(), String> {
    let start = Instant::now();
    let reader: Box<dyn BufRead> = if input == "-" {
        Box::new(io::stdin().lock())
    } else {
        let trace_file = File::open(input).map_err(|e| format!("Couldn't open the reference stream at path {input}: {e}"))?;
        Box::new(get_reader(trace_file)?)
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut labels = classify_stream(reader, block_size, miss_level);
    for result in labels.by_ref() {
        let (reference, class) = result.map_err(|e| format!("error: {e}"))?;
        if !summary {
            writeln!(out, "{}", LabelLine::new(&reference, class)).map_err(|e| format!("Couldn't write the output: {e}"))?;
        }
    }
    let counts = labels.counts();
    if summary {
        let report = if json {
            serde_json::to_string_pretty(counts).map_err(|e| format!("Couldn't serialise the output {e}"))?
        } else {
            counts.to_string()
        };
        writeln!(out, "{report}").map_err(|e| format!("Couldn't write the output: {e}"))?;
    }
    out.flush().map_err(|e| format!("Couldn't write the output: {e}"))?;
    info!("Classification time: {}s", start.elapsed().as_nanos() as f64 / 1e9);
    Ok(())
}
