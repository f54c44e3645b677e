pub mod commands;
pub mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use pillsprint_core::config::{ConfigOverrides, LlmProvider, LoadOptions};

#[derive(Debug, Parser)]
#[command(
    name = "pillsprint",
    about = "PillSprint pharmacy assistant CLI",
    long_about = "Symptom-based medicine recommendations, catalog browsing, composition insights, and store operations.",
    after_help = "Examples:\n  pillsprint recommend \"headache and mild fever\"\n  pillsprint search paracetamol\n  pillsprint --llm-provider disabled recommend \"dry cough\" --json\n  pillsprint doctor --json"
)]
pub struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    #[arg(
        long = "config",
        global = true,
        value_name = "PATH",
        help = "Configuration file to load"
    )]
    config_path: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        value_name = "URL",
        help = "Override database.url for this invocation"
    )]
    database_url: Option<String>,
    #[arg(
        long,
        global = true,
        value_name = "PROVIDER",
        value_parser = parse_provider,
        help = "Override llm.provider (gemini, ollama, disabled)"
    )]
    llm_provider: Option<LlmProvider>,
    #[arg(long, global = true, value_name = "MODEL", help = "Override llm.model")]
    llm_model: Option<String>,
    #[arg(long, global = true, value_name = "LEVEL", help = "Override logging.level")]
    log_level: Option<String>,
    #[arg(
        long,
        global = true,
        value_name = "SECONDS",
        help = "Override recommendation.ai_timeout_secs"
    )]
    ai_timeout_secs: Option<u64>,
}

impl GlobalArgs {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            require_file: self.config_path.is_some(),
            config_path: self.config_path.clone(),
            overrides: ConfigOverrides {
                database_url: self.database_url.clone(),
                log_level: self.log_level.clone(),
                llm_provider: self.llm_provider,
                llm_model: self.llm_model.clone(),
                ai_timeout_secs: self.ai_timeout_secs,
                ..ConfigOverrides::default()
            },
        }
    }
}

fn parse_provider(raw: &str) -> Result<LlmProvider, String> {
    raw.parse::<LlmProvider>().map_err(|error| error.to_string())
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Recommend in-stock medicines for a free-text symptom description")]
    Recommend {
        symptoms: String,
        #[arg(long, help = "Emit the recommendation as JSON")]
        json: bool,
    },
    #[command(about = "Search the catalog by name, description, or category")]
    Search {
        text: String,
        #[arg(long, help = "Emit matching records as JSON")]
        json: bool,
    },
    #[command(about = "Show one medicine by id")]
    Show {
        id: String,
        #[arg(long, help = "Emit the record as JSON")]
        json: bool,
    },
    #[command(about = "List emergency medicines")]
    Emergency {
        #[arg(long, help = "Emit records as JSON")]
        json: bool,
    },
    #[command(about = "Explain a composition: ingredients, benefits, side effects, warnings")]
    Analyze {
        composition: String,
        #[arg(long, help = "Condition to judge suitability against")]
        condition: Option<String>,
    },
    #[command(about = "Compare prices, alternatives, and generic options for a medicine")]
    Compare {
        name: String,
        #[arg(long, help = "Composition to match alternatives against")]
        composition: Option<String>,
    },
    #[command(about = "Ask the pharmacy assistant a question")]
    Chat {
        message: String,
        #[arg(long, value_name = "FILE", help = "JSON file with earlier turns")]
        history: Option<PathBuf>,
    },
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the demo medicine catalog (idempotent)")]
    Seed,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, model provider readiness, and catalog database checks")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.global.load_options();
    logging::init(&options);

    let result = match cli.command {
        Command::Recommend { symptoms, json } => {
            commands::recommend::run(options, &symptoms, json)
        }
        Command::Search { text, json } => commands::catalog::search(options, &text, json),
        Command::Show { id, json } => commands::catalog::show(options, &id, json),
        Command::Emergency { json } => commands::catalog::emergency(options, json),
        Command::Analyze { composition, condition } => {
            commands::insights::analyze(options, &composition, condition.as_deref())
        }
        Command::Compare { name, composition } => {
            commands::insights::compare(options, &name, composition.as_deref())
        }
        Command::Chat { message, history } => {
            commands::chat::run(options, &message, history.as_deref())
        }
        Command::Migrate => commands::migrate::run(options),
        Command::Seed => commands::seed::run(options),
        Command::Config => commands::config::run(options),
        Command::Doctor { json } => commands::doctor::run(options, json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
