use clap::{Parser, Subcommand};
use handpress::{build, config, report};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "handpress")]
#[command(about = "Incremental builder for hand-authored HTML blogs")]
#[command(long_about = "\
Incremental builder for hand-authored HTML blogs

Posts are plain HTML documents that carry their own metadata in <meta> tags.
Each post is composed into a full page using HTML templates, an index page
is aggregated from every post, and posts whose output is already newer than
their inputs are skipped.

Site layout:

  posts/
  ├── config.toml                # Site config (optional, sparse overrides)
  ├── my-first-post.html         # Post: <meta name=\"created\">, <meta name=\"slug\">
  └── diagram.png                # Post image → copied to output root
  resources/
  ├── page.html                  # Per-post page chrome, with an <article> slot
  ├── index.html                 # Index page chrome
  ├── header.html                # <header> fragment
  ├── footer.html                # <footer> fragment
  ├── aside.html                 # <aside> fragment
  └── main.css                   # Shared stylesheet → copied to output root
  output/
  ├── index.html                 # Generated index, newest post first
  ├── main.css
  └── 2024-01-01/my-first.html   # Generated post at created/slug.html

Required post metadata:
  created:  <meta name=\"created\" content=\"2024-01-01\">
  slug:     <meta name=\"slug\" content=\"my-first\">
  title:    optional; falls back to <title>, then to the slug

Run 'handpress gen-config' to print a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Post source directory
    #[arg(long, default_value = "posts", global = true)]
    source: PathBuf,

    /// Directory holding templates and the stylesheet
    #[arg(long, default_value = "resources", global = true)]
    resources: PathBuf,

    /// Output directory
    #[arg(long, default_value = "output", global = true)]
    output: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build stale posts, the index, and static resources
    Build {
        /// Rebuild every post regardless of freshness
        #[arg(long)]
        force: bool,
    },
    /// List every post with its metadata and staleness, writing nothing
    Scan {
        /// Emit the inventory as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate that every post parses and carries its required metadata
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when the command completed but some posts failed, so
/// the exit code reflects the failures without hiding the rest of the output.
fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let opts = build::BuildOptions {
        source: cli.source.clone(),
        resources: cli.resources.clone(),
        output: cli.output.clone(),
        force: false,
    };

    match cli.command {
        Command::Build { force } => {
            let opts = build::BuildOptions { force, ..opts };
            println!(
                "==> Building {} \u{2192} {}",
                opts.source.display(),
                opts.output.display()
            );
            let summary = build::build(&opts)?;
            report::print_build_output(&summary);
            Ok(summary.is_success())
        }
        Command::Scan { json } => {
            let scan_report = build::scan(&opts)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&scan_report)?);
            } else {
                report::print_scan_output(&scan_report);
            }
            Ok(scan_report.failures.is_empty())
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let check_report = build::check(&cli.source)?;
            report::print_check_output(&check_report);
            Ok(check_report.is_success())
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            Ok(true)
        }
    }
}
