use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use carewizard::submit::EnvTokenSource;
use carewizard::{
    Advance, ConfigError, FlowKind, FormState, HttpSubmitter, Phase, SubmitRequest, Submitter, WizardConfig,
    WizardSession,
};
use clap::{Args, Parser, Subcommand};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to read answers file {}: {source}", path.display())]
    ReadAnswers { path: PathBuf, source: std::io::Error },
    #[error("invalid answers file: {0}")]
    InvalidAnswers(#[from] serde_json::Error),
    #[error("step `{step}` has {count} invalid field(s)")]
    Blocked { step: &'static str, count: usize },
    #[error("session stopped accepting input before submission")]
    SessionClosed,
    #[error("submission failed: {0}")]
    Submission(String),
}

#[derive(Parser, Debug)]
#[command(name = "carewizard", about = "Drive the telehealth registration and booking wizards")]
struct Cli {
    /// Overrides `CAREWIZARD_API_BASE_URL`.
    #[arg(long)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a patient, doctor or pharmacist account.
    Register(RunArgs),
    /// Book an appointment.
    Book(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// JSON object mapping field names to values.
    #[arg(long)]
    answers: PathBuf,

    /// Print the payload instead of sending it.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = WizardConfig::from_env()?;
    if let Some(url) = cli.base_url.as_deref() {
        config = config.with_base_url(url)?;
    }

    let (kind, args) = match cli.command {
        Command::Register(args) => (FlowKind::Registration, args),
        Command::Book(args) => (FlowKind::Booking, args),
    };
    let answers = load_answers(&args.answers)?;

    let mut session = WizardSession::new(config.flow(kind));
    let request = walk(&mut session, &answers)?;

    if args.dry_run {
        println!("POST {}{}", config.api_base_url, request.path);
        println!("{}", serde_json::to_string_pretty(&request.payload)?);
        return Ok(());
    }

    let submitter =
        HttpSubmitter::new(&config)?.with_token_source(Box::new(EnvTokenSource::new(config.auth_token_env.clone())));
    let result = submitter.submit(&request).await;
    session.complete_submission(result);

    match (session.phase(), session.confirmation()) {
        (Phase::Submitted, Some(confirmation)) => {
            println!("submitted: {}", confirmation.token.as_deref().unwrap_or("(no confirmation id)"));
            if let Some(message) = &confirmation.message {
                println!("{message}");
            }
            Ok(())
        }
        _ => Err(CliError::Submission(session.banner().unwrap_or_default())),
    }
}

fn load_answers(path: &Path) -> Result<FormState, CliError> {
    let raw = fs::read_to_string(path).map_err(|source| CliError::ReadAnswers { path: path.to_owned(), source })?;
    Ok(serde_json::from_str(&raw)?)
}

/// Feed each step's answers through the session until it yields the final request.
fn walk(session: &mut WizardSession, answers: &FormState) -> Result<SubmitRequest, CliError> {
    loop {
        let descriptor = session.current_descriptor();
        for field in &descriptor.fields {
            if let Some(value) = answers.get(field.name) {
                session.update_field(field.name, value.clone());
            }
        }

        match session.advance() {
            Advance::Moved { .. } => {}
            Advance::ReadyToSubmit(request) => return Ok(request),
            Advance::Blocked(errors) => {
                let (step, of) = session.progress();
                eprintln!("step {step}/{of} ({}):", descriptor.title);
                for (name, err) in &errors {
                    eprintln!("  {name}: {}", err.message);
                }
                return Err(CliError::Blocked { step: descriptor.id, count: errors.len() });
            }
            Advance::Ignored => return Err(CliError::SessionClosed),
        }
    }
}
