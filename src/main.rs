use clap::{Parser, Subcommand};
use liara::{config, output, pipeline};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "liara")]
#[command(about = "Static site generator for file-driven sites")]
#[command(long_about = "\
Static site generator for file-driven sites

Your filesystem is the data source. Markdown files become pages, directories
become sections, YAML files become site data, and templates pick what to show.

Project structure:

  project/
  ├── config.toml                  # Project config (optional)
  ├── content/
  │   ├── _index.md                # Section root: page at /
  │   ├── about.md                 # Page at /about
  │   ├── authors.yaml             # Data, available as site.data
  │   └── blog/                    # Index page at /blog
  │       ├── first.md             # Page at /blog/first
  │       └── second.md
  ├── resources/
  │   └── css/site.scss            # Compiled to /css/site.css
  ├── static/
  │   └── img/logo.png             # Linked to /img/logo.png
  └── templates/
      ├── routes.yaml              # URL glob → template name
      └── page.html

Every markdown file needs a 'title' in its front matter:

  ---
  title: First post
  ---
  Body in markdown.

Run 'liara gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Project root directory
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Config file (defaults to config.toml in the project root)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline: discover → process → render → emit
    Build,
    /// Discover and validate content without writing output
    Check {
        /// Print the discovered site as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Build => {
            let site_config = load_config(&cli.root, cli.config.as_deref())?;
            let output_dir = site_config.output_dir(&cli.root);

            println!("==> Building {} → {}", cli.root.display(), output_dir.display());
            let report = pipeline::build(&cli.root, &site_config)?;
            output::print_build_report(&report);

            println!("==> Build complete: {}", output_dir.display());
        }
        Command::Check { json } => {
            let site_config = load_config(&cli.root, cli.config.as_deref())?;
            if json {
                let site = pipeline::check(&cli.root, &site_config)?;
                println!("{}", serde_json::to_string_pretty(&output::site_json(&site)?)?);
            } else {
                println!("==> Checking {}", cli.root.display());
                let site = pipeline::check(&cli.root, &site_config)?;
                output::print_site(&site, &cli.root);
                println!("==> Content is valid");
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Warnings by default; each `-v` raises the level. `RUST_LOG` still wins.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn load_config(root: &Path, explicit: Option<&Path>) -> Result<config::SiteConfig, config::ConfigError> {
    match explicit {
        Some(path) => config::load_config_file(path),
        None => config::load_config(root),
    }
}
