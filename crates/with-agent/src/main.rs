//! WITH command-line client
//!
//! Submits a short note to the classification service and, when the note is
//! classified as elevated or critical, asks for consent before requesting a
//! generated support reply.
//!
//! # Usage
//!
//! ```bash
//! # Classify a note, asking before any generated reply
//! with-agent note "estou nervoso e no limite agora"
//!
//! # Decide up front
//! with-agent note "estou nervoso" --consent later
//!
//! # Canned micro-habit, no network
//! with-agent quick water
//!
//! # Interactive loop
//! WITH_API_BASE=https://with.example.app with-agent repl
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use with_agent::{
    check_health, EscalationSession, HttpTransport, ServiceConfig, SessionError, Transport,
};
use with_coordination::escalation::copy;
use with_coordination::{QuickAction, SessionSnapshot};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML config file (overridden by WITH_API_BASE / WITH_TIMEOUT_SECS)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print the session snapshot as JSON instead of the reply text
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify a note; escalated notes need consent before a reply is generated
    Note {
        /// The note text
        text: String,

        /// Consent decision if the note is escalated
        #[arg(long, value_enum, default_value_t = ConsentChoice::Ask)]
        consent: ConsentChoice,
    },
    /// Run a canned micro-habit prompt (pause, water, stretch)
    Quick { action: QuickAction },
    /// Check that the service is reachable
    Health,
    /// Interactive session: type notes, `:quick <action>`, `:quit`
    Repl,
}

/// Decision on the consent gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ConsentChoice {
    /// Generate support now
    Now,
    /// Not now; keep the note
    Later,
    /// Dismiss silently
    Ignore,
    /// Prompt on stdin
    Ask,
}

impl ConsentChoice {
    fn parse_answer(answer: &str) -> Option<Self> {
        match answer.trim().to_ascii_lowercase().as_str() {
            "a" | "agora" | "now" | "y" | "yes" | "s" | "sim" => Some(Self::Now),
            "d" | "depois" | "later" => Some(Self::Later),
            "i" | "ignorar" | "ignore" | "n" | "no" | "nao" | "não" => Some(Self::Ignore),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let config = ServiceConfig::load(args.config.as_deref())?;
    info!(base_url = %config.base_url, "with-agent starting");

    let transport =
        Arc::new(HttpTransport::new(config.clone()).context("Failed to build HTTP client")?);

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted; abandoning outstanding request");
                cancel.cancel();
            }
        }
    });

    let mut session =
        EscalationSession::new(Arc::clone(&transport)).with_cancel_token(cancel.clone());
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    match args.command {
        Command::Note { text, consent } => {
            let snapshot = session.submit_note(text).await?;
            let snapshot = resolve_consent(&mut session, &mut stdin, snapshot, consent).await?;
            render(&snapshot, &config, args.json)?;
        }
        Command::Quick { action } => {
            let snapshot = session.quick_action(action).await?;
            render(&snapshot, &config, args.json)?;
        }
        Command::Health => {
            let status = tokio::select! {
                _ = cancel.cancelled() => bail!("Health check interrupted"),
                status = check_health(transport.as_ref()) => {
                    status.context("Health check failed")?
                }
            };
            println!("{} • API: {}", status, config.display_host());
        }
        Command::Repl => run_repl(&mut session, &mut stdin, &config, args.json).await?,
    }

    Ok(())
}

/// Next input line, or `None` on end of input or once `cancel` fires.
async fn next_line<R: AsyncBufRead + Unpin>(
    lines: &mut Lines<R>,
    cancel: &CancellationToken,
) -> Result<Option<String>> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Ok(None),
        line = lines.next_line() => line.context("Failed to read stdin"),
    }
}

/// Apply the consent decision if the gate is open; otherwise pass through.
async fn resolve_consent<T: Transport, R: AsyncBufRead + Unpin>(
    session: &mut EscalationSession<T>,
    stdin: &mut Lines<R>,
    snapshot: SessionSnapshot,
    choice: ConsentChoice,
) -> Result<SessionSnapshot> {
    if !snapshot.consent_gate_visible {
        return Ok(snapshot);
    }

    let choice = match choice {
        ConsentChoice::Ask => match ask_consent(stdin, &session.cancel_token()).await? {
            Some(choice) => choice,
            None => return Ok(snapshot),
        },
        other => other,
    };

    let snapshot = match choice {
        ConsentChoice::Now => session.consent_now().await?,
        ConsentChoice::Later => session.consent_later().await?,
        ConsentChoice::Ignore | ConsentChoice::Ask => session.consent_ignore().await?,
    };
    Ok(snapshot)
}

/// Prompt until a recognised answer arrives; end of input counts as ignore.
///
/// Returns `None` when interrupted.
async fn ask_consent<R: AsyncBufRead + Unpin>(
    stdin: &mut Lines<R>,
    cancel: &CancellationToken,
) -> Result<Option<ConsentChoice>> {
    eprintln!("{}", copy::CONSENT_TITLE);
    loop {
        eprintln!("{} [agora / depois / ignorar]", copy::CONSENT_QUESTION);
        let Some(line) = next_line(stdin, cancel).await? else {
            if cancel.is_cancelled() {
                return Ok(None);
            }
            return Ok(Some(ConsentChoice::Ignore));
        };
        if let Some(choice) = ConsentChoice::parse_answer(&line) {
            return Ok(Some(choice));
        }
    }
}

async fn run_repl<T: Transport, R: AsyncBufRead + Unpin>(
    session: &mut EscalationSession<T>,
    stdin: &mut Lines<R>,
    config: &ServiceConfig,
    json: bool,
) -> Result<()> {
    eprintln!("Escreve 1 frase. Eu classifico e só entro com sua permissão.");
    eprintln!(
        "Quick: {}",
        QuickAction::ALL
            .iter()
            .map(|a| format!(":quick {} ({})", a, a.label()))
            .collect::<Vec<_>>()
            .join(", ")
    );

    let cancel = session.cancel_token();
    while let Some(line) = next_line(stdin, &cancel).await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == ":quit" || line == ":q" {
            break;
        }

        let result = if let Some(rest) = line.strip_prefix(":quick") {
            match rest.parse::<QuickAction>() {
                Ok(action) => session.quick_action(action).await,
                Err(e) => {
                    eprintln!("{e}");
                    continue;
                }
            }
        } else {
            session.submit_note(line).await
        };

        let snapshot = match result {
            Ok(snapshot) => {
                resolve_consent(session, stdin, snapshot, ConsentChoice::Ask).await?
            }
            Err(SessionError::Cancelled) => break,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };
        render(&snapshot, config, json)?;

        if cancel.is_cancelled() {
            break;
        }
    }
    Ok(())
}

fn render(snapshot: &SessionSnapshot, config: &ServiceConfig, json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(snapshot).context("Failed to encode snapshot")?;
        println!("{out}");
        return Ok(());
    }
    if !snapshot.reply.is_empty() {
        println!("{}", snapshot.reply);
    }
    eprintln!("state: {} • API: {}", snapshot.tier, config.display_host());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_consent_answers() {
        assert_eq!(ConsentChoice::parse_answer("Agora"), Some(ConsentChoice::Now));
        assert_eq!(ConsentChoice::parse_answer(" d "), Some(ConsentChoice::Later));
        assert_eq!(
            ConsentChoice::parse_answer("ignorar"),
            Some(ConsentChoice::Ignore)
        );
        assert_eq!(ConsentChoice::parse_answer("talvez"), None);
    }

    #[tokio::test]
    async fn test_ask_consent_reads_until_recognised_answer() {
        let mut input = BufReader::new(&b"talvez\n depois \n"[..]).lines();
        let choice = ask_consent(&mut input, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(choice, Some(ConsentChoice::Later));
    }

    #[tokio::test]
    async fn test_ask_consent_end_of_input_ignores() {
        let mut input = BufReader::new(&b""[..]).lines();
        let choice = ask_consent(&mut input, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(choice, Some(ConsentChoice::Ignore));
    }

    #[tokio::test]
    async fn test_interrupt_releases_waiting_prompt() {
        // The writer half stays open, so the read would block forever.
        let (_writer, reader) = tokio::io::duplex(64);
        let mut input = BufReader::new(reader).lines();
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_eq!(next_line(&mut input, &cancel).await.unwrap(), None);
        assert_eq!(ask_consent(&mut input, &cancel).await.unwrap(), None);
    }

    #[test]
    fn test_cli_parses_note_with_consent() {
        let args = Args::try_parse_from(["with-agent", "note", "help", "--consent", "later"])
            .unwrap();
        match args.command {
            Command::Note { text, consent } => {
                assert_eq!(text, "help");
                assert_eq!(consent, ConsentChoice::Later);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_parses_quick_action() {
        let args = Args::try_parse_from(["with-agent", "quick", "stretch", "--json"]).unwrap();
        assert!(args.json);
        assert!(matches!(
            args.command,
            Command::Quick {
                action: QuickAction::Stretch
            }
        ));
    }
}
