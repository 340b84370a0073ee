use clap::{Parser, Subcommand};
use html_inject::pipeline::{self, BuildEvent, ChunkInfo};
use html_inject::template::TemplateSource;
use html_inject::{config, logging, output, scan};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "html-inject")]
#[command(about = "Inject built scripts and stylesheets into an HTML template")]
#[command(long_about = "\
Inject built scripts and stylesheets into an HTML template

After a bundler has written its output, html-inject scans the output
directory for .js and .css files, renames files whose names carry the hash
placeholder (app.[hash].js → app.9c1e04b2.js), and writes the template with
a <script> or <link> tag for each one.

Build event (--event FILE.json):

  {
    \"chunks\": [{ \"fileName\": \"dist/app.[hash].js\", \"isEntry\": true, \"sourcemap\": true }],
    \"entryCode\": \"...final code of the entry chunk...\"
  }

The output directory is `dest` from the config, else the first directory of
the entry file (dist/js/app.js → dist).

Run 'html-inject gen-config' to generate a documented html-inject.toml.")]
#[command(version)]
struct Cli {
    /// Config file (missing file means all defaults)
    #[arg(long, default_value = config::DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct InjectArgs {
    /// Build event JSON written by the bundler
    #[arg(long, conflicts_with_all = ["entry", "entry_code", "sourcemap"])]
    event: Option<PathBuf>,

    /// Entry chunk file, relative to the working directory
    #[arg(long)]
    entry: Option<String>,

    /// File holding the entry chunk's final code
    #[arg(long, requires = "entry")]
    entry_code: Option<PathBuf>,

    /// The build emitted <file>.map sourcemaps
    #[arg(long, requires = "entry")]
    sourcemap: bool,

    /// Template file or inline markup (overrides the config)
    #[arg(long)]
    template: Option<String>,

    /// Output directory (overrides the config)
    #[arg(long)]
    dest: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the output directory, hash file names, and write the HTML
    Inject(InjectArgs),
    /// List the artifacts an injection would reference
    Scan {
        /// Output directory to scan (defaults to `dest` from the config)
        dir: Option<PathBuf>,
    },
    /// Print a stock html-inject.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Command::Inject(args) => {
            let mut config = config::load_config(&cli.config)?;
            if let Some(template) = &args.template {
                config.template = Some(TemplateSource::sniff(template));
            }
            if let Some(dest) = &args.dest {
                config.dest = Some(dest.clone());
            }

            let event = build_event(&args)?;
            let report = pipeline::run(&config, &event)?;
            let output_dir = report
                .destination
                .parent()
                .map(PathBuf::from)
                .unwrap_or_default();
            output::print_run_report(&report, &output_dir);
        }
        Command::Scan { dir } => {
            let config = config::load_config(&cli.config)?;
            let root = dir
                .or(config.dest.clone())
                .unwrap_or_else(|| PathBuf::from("dist"));
            let artifacts = scan::scan(&root)?;
            let ignore = config.ignore_pattern()?;
            output::print_scan_output(&artifacts, ignore.as_ref(), &root);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Build event from `--event`, or from the individual entry flags.
fn build_event(args: &InjectArgs) -> Result<BuildEvent, Box<dyn std::error::Error>> {
    if let Some(path) = &args.event {
        let json = std::fs::read_to_string(path)?;
        return Ok(serde_json::from_str(&json)?);
    }

    let entry_code = match &args.entry_code {
        Some(path) => Some(std::fs::read_to_string(path)?),
        None => None,
    };
    let chunks = args
        .entry
        .iter()
        .map(|file_name| ChunkInfo {
            file_name: file_name.clone(),
            is_entry: true,
            sourcemap: args.sourcemap,
        })
        .collect();
    Ok(BuildEvent { chunks, entry_code })
}
