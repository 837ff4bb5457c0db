use clap::{Parser, Subcommand};
use display_error_chain::DisplayErrorChain;
use dotenv::dotenv;
use snafu::{ResultExt, Snafu};
use std::{io::Write, path::PathBuf, process::ExitCode, time::Duration};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use viral_director::{
    collector, config, profile::CAPABILITIES, render, render::Body, Config, Phase, Profile,
    ProfileId, RenderMode, Session, TerminalRenderer,
};

#[derive(Parser)]
#[command(name = "viral-director")]
#[command(about = "Production-team feedback on your video, image or script", long_about = None)]
struct Cli {
    /// Analysis profile (prompt, roles and output style)
    #[arg(long, global = true, env = config::PROFILE_VAR)]
    profile: Option<ProfileId>,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a video/image and/or a note for analysis
    Analyze {
        /// Video or image to analyze
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Notes for the director, e.g. "audition for a villain in a thriller"
        #[arg(short, long)]
        note: Option<String>,

        /// Output style: cards or json (defaults to the profile's)
        #[arg(short, long)]
        output: Option<RenderMode>,

        /// Model to use
        #[arg(long, env = config::MODEL_VAR)]
        model: Option<String>,

        /// Abort the request after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// List the team members of a profile
    Roles,

    /// Describe what the team can do
    Capabilities,
}

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("invalid configuration"))]
    Config { source: config::Error },

    #[snafu(display("cannot use the selected file"))]
    Attachment { source: collector::Error },

    #[snafu(display("failed to write output"))]
    Output { source: std::io::Error },
}

async fn do_main(cli: Cli) -> Result<ExitCode, Error> {
    let mut config = Config::from_env().context(ConfigSnafu)?;
    if let Some(profile) = cli.profile {
        config.profile = profile;
    }
    let profile = config.profile();
    let terminal = TerminalRenderer::new(!cli.no_color);
    let mut stdout = std::io::stdout();

    match cli.command {
        Commands::Roles => {
            print_roles(&mut stdout, profile).context(OutputSnafu)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Capabilities => {
            print_capabilities(&mut stdout).context(OutputSnafu)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Analyze {
            file,
            note,
            output,
            model,
            timeout_secs,
        } => {
            if let Some(model) = model {
                config.model = model;
            }
            config.timeout = timeout_secs.map(Duration::from_secs);
            info!(?config, "configuration loaded");

            let dispatcher = config.dispatcher().context(ConfigSnafu)?;
            let mode = output.unwrap_or(profile.render_mode);

            let mut session = Session::new();
            if let Some(path) = file {
                // Without a key the dispatcher reports the missing credential first.
                let loaded = match config.api_key {
                    Some(_) => {
                        session
                            .load_attachment_within(&path, dispatcher.max_attachment_bytes())
                            .await
                    }
                    None => session.load_attachment(&path).await,
                };
                loaded.context(AttachmentSnafu)?;
            }
            if let Some(note) = note {
                session.set_note(note);
            }

            if let Some(attachment) = session.collector().attachment() {
                info!(name = attachment.name.as_deref(), mime = %attachment.mime, size = attachment.len(), "attachment selected");
            }
            eprintln!("{}", profile.messages.submitting);
            session.submit(&dispatcher).await;

            let view = render(&session, profile, mode);
            let code = match session.phase() {
                Phase::Failed(err) => {
                    error!(kind = ?err.kind(), error = %DisplayErrorChain::new(err), "analysis failed");
                    terminal
                        .write_view(&mut std::io::stderr(), &view)
                        .context(OutputSnafu)?;
                    ExitCode::FAILURE
                }
                _ if matches!(view.body, Body::Notice(_)) => {
                    warn!(profile = %profile.id, "response has no section for this profile");
                    terminal
                        .write_view(&mut std::io::stderr(), &view)
                        .context(OutputSnafu)?;
                    ExitCode::FAILURE
                }
                _ => {
                    terminal.write_view(&mut stdout, &view).context(OutputSnafu)?;
                    ExitCode::SUCCESS
                }
            };
            Ok(code)
        }
    }
}

fn print_roles(out: &mut impl Write, profile: &Profile) -> std::io::Result<()> {
    writeln!(out, "{} ({})", profile.name, profile.id)?;
    for role in profile.roles {
        writeln!(out, "  {:<16} {} / {}", role.key, role.title, role.subtitle)?;
        writeln!(out, "  {:<16} {}", "", role.summary)?;
    }
    Ok(())
}

fn print_capabilities(out: &mut impl Write) -> std::io::Result<()> {
    for (heading, items) in CAPABILITIES {
        writeln!(out, "{heading}")?;
        for item in *items {
            writeln!(out, "  • {item}")?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match do_main(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{}", DisplayErrorChain::new(&err));
            ExitCode::FAILURE
        }
    }
}
