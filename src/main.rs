#![forbid(unsafe_code)]
//! Question Generator Command Line Interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

use qgen::commands::{
    execute_fewshots, execute_generate, execute_init, execute_topics, FewshotsOptions,
    GenerateOptions, InitOptions, RequestArgs, TopicsOptions,
};
use qgen::config::DEFAULT_CONFIG_FILE;
use qgen::{Config, QgenError};

#[derive(Parser)]
#[command(name = "qgen")]
#[command(about = "Curriculum-aligned exam question generator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Fields identifying a question request
#[derive(clap::Args)]
struct RequestArgsCli {
    /// Subject (Math, Physics, Chemistry, ...)
    #[arg(short, long)]
    subject: String,

    /// Curriculum (GCSE or ALevel)
    #[arg(long, default_value = "GCSE")]
    curriculum: String,

    /// Chapter number (GCSE math), sheet name (A-Level math) or chapter name (science)
    #[arg(long)]
    chapter: Option<String>,

    /// Topic (math) or subtopic (science)
    #[arg(short, long)]
    topic: String,

    /// Difficulty level
    #[arg(short, long, default_value = "Medium")]
    difficulty: String,

    /// Question type (required for science)
    #[arg(short = 'q', long)]
    question_type: Option<String>,

    /// Number of questions to generate
    #[arg(short = 'n', long, default_value_t = 5)]
    num_questions: usize,
}

impl From<RequestArgsCli> for RequestArgs {
    fn from(args: RequestArgsCli) -> Self {
        RequestArgs {
            subject: args.subject,
            curriculum: args.curriculum,
            chapter: args.chapter,
            topic: args.topic,
            difficulty: args.difficulty,
            question_type: args.question_type,
            num_questions: args.num_questions,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create a config file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,

        /// Folder with curated workbooks
        #[arg(long)]
        data_root: Option<PathBuf>,

        /// Folder for generated workbooks
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Fixed sampling seed
        #[arg(long)]
        seed: Option<u64>,

        /// Skip interactive prompts (use defaults + CLI args)
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Generate questions and export them to an xlsx workbook
    Generate {
        #[command(flatten)]
        request: RequestArgsCli,

        /// API key (overrides the configured environment variable)
        #[arg(long, env = "QGEN_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the few-shot examples a request would use
    Fewshots {
        #[command(flatten)]
        request: RequestArgsCli,

        /// Sampling seed
        #[arg(long)]
        seed: Option<u64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build the topic listing for a subject
    Topics {
        /// Subject (Math, Physics, Chemistry, ...)
        #[arg(short, long)]
        subject: String,

        /// Curriculum (GCSE or ALevel)
        #[arg(long, default_value = "GCSE")]
        curriculum: String,

        /// GCSE math chapters to scan
        #[arg(long, value_delimiter = ',', default_value = "1,2,3,4,5")]
        chapters: Vec<u32>,

        /// Output JSON file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("{} {:#}", style("✗").red(), err);
        let code = err
            .downcast_ref::<QgenError>()
            .map(|e| e.kind().exit_code())
            .unwrap_or(1);
        std::process::exit(code);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "qgen=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    // Load config
    let config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };

    match cli.command {
        Commands::Init { force, data_root, output_dir, seed, yes } => {
            let options = InitOptions {
                config_path: cli.config,
                force,
                data_root,
                output_dir,
                seed,
                yes,
            };
            execute_init(options)?;
        }

        Commands::Generate { request, api_key, json } => {
            let options = GenerateOptions {
                request: request.into(),
                api_key,
                json,
            };
            execute_generate(options, config)?;
        }

        Commands::Fewshots { request, seed, json } => {
            let options = FewshotsOptions {
                request: request.into(),
                seed,
                json,
            };
            execute_fewshots(options, config)?;
        }

        Commands::Topics { subject, curriculum, chapters, output } => {
            let options = TopicsOptions {
                subject,
                curriculum,
                chapters,
                output,
            };
            execute_topics(options, config)?;
        }
    }

    Ok(())
}
