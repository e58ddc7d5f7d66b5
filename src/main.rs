use clap::{Parser, Subcommand};
use lesson_pack::archive::{DirSink, emit};
use lesson_pack::assemble::{DirTemplates, EmbeddedTemplates, TemplateSource};
use lesson_pack::config::{self, ConfigError};
use lesson_pack::{output, pages, project};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "lesson-pack")]
#[command(about = "Export authored online lessons as zip packages")]
#[command(long_about = "\
Export authored online lessons as zip packages

A lesson project is a directory with a configuration, a page tree and media:

  my-lesson/
  ├── lesson.toml        # Title, language, variant, feature flags
  ├── menu.json          # Page tree: { \"menu\": [ { \"title\": ..., \"menu\": [...] } ] }
  └── assets/            # Images, video, audio, documents
      ├── diagram.png    # → assets/images/diagram.png
      └── handout.pdf    # → assets/documents/handout.pdf

Variants:
  legacy     PHP package, one print_<N>.php per top-level page (default)
  standard   Static HTML package, one pages/<l1>-<l2>-<l3>.html per page

Set RUST_LOG=debug for detailed logs.
Run 'lesson-pack gen-config' to generate a documented lesson.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Lesson project directory
    #[arg(long, default_value = ".", global = true)]
    source: PathBuf,

    /// Output directory for the archive
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate the project and print a summary
    Check,
    /// Assemble the lesson and write the zip archive
    Export {
        /// Read templates from this directory instead of the built-in set
        #[arg(long)]
        templates: Option<PathBuf>,
    },
    /// Parse a menu document and print its page tree
    Import {
        /// Menu JSON file
        file: PathBuf,
    },
    /// Print a stock lesson.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Check => {
            let session = project::load_project(&cli.source)?;
            let problems = match session.config().validate() {
                Ok(()) => Vec::new(),
                Err(ConfigError::Validation(problems)) => problems,
                Err(e) => return Err(e.into()),
            };
            output::print_check_output(&session, &problems);
            if !problems.is_empty() {
                std::process::exit(1);
            }
        }
        Command::Export { templates } => {
            let session = project::load_project(&cli.source)?;
            let source: Box<dyn TemplateSource> = match templates {
                Some(dir) => Box::new(DirTemplates::new(dir)),
                None => Box::new(EmbeddedTemplates),
            };
            let package = session.export(source.as_ref())?;
            let name = session.snapshot().archive_name();
            let path = emit(&package, &name, &mut DirSink::new(&cli.output))?;
            output::print_export_output(&package, &path);
        }
        Command::Import { file } => {
            let json = std::fs::read_to_string(&file)?;
            let tree = pages::import_tree(&json)?;
            output::print_import_output(&tree);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` overrides the default `warn` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
