use clap::{Parser, Subcommand};
use orderbell_cli::CliContext;
use orderbell_cli::commands;
use orderbell_cli::readline;
use orderbell_core::audio::UserGesture;
use orderbell_core::context::logging;
use std::io::Write;

#[tokio::main]
async fn main() -> Result<(), String> {
    let _log_guard = logging::init();

    let ctx = CliContext::new();
    let _event_log = ctx.spawn_event_log();

    loop {
        let Some(line) = readline()? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        ctx.gesture(UserGesture::KeyPress);

        match respond(line, &ctx).await {
            Ok(quit) => {
                if quit {
                    break;
                }
            }
            Err(err) => {
                write!(std::io::stdout(), "{err}").map_err(|e| e.to_string())?;
                std::io::stdout().flush().map_err(|e| e.to_string())?;
            }
        }
    }

    ctx.sounds.stop_all();
    Ok(())
}

#[derive(Parser)]
#[command(version, about = "order notification chime console")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the chime for an order
    Play {
        #[arg(short, long)]
        id: String,
    },
    Stop {
        #[arg(short, long)]
        id: String,
    },
    StopAll,
    Active,
    /// Canonicalize a status label
    Status {
        #[arg(short, long)]
        label: String,
    },
    /// Parse an order item payload
    Items {
        #[arg(short, long)]
        json: String,
    },
    /// Countdown for an order created at an RFC 3339 timestamp
    Countdown {
        #[arg(short, long)]
        created: Option<String>,
        #[arg(short, long)]
        extra: Option<f64>,
    },
    Hours,
    Config,
    /// Set the kitchen-wide preparation time
    Prep {
        #[arg(short, long)]
        minutes: u32,
    },
    Exit,
}

async fn respond(line: &str, ctx: &CliContext) -> Result<bool, String> {
    let mut args = shlex::split(line).ok_or("error: Invalid quoting")?;
    args.insert(0, "orderbell".to_string());
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;

    match &cli.command {
        Some(Commands::Play { id }) => commands::play(id, ctx).await?,
        Some(Commands::Stop { id }) => commands::stop(id, ctx),
        Some(Commands::StopAll) => commands::stop_all(ctx),
        Some(Commands::Active) => commands::show_active(ctx),
        Some(Commands::Status { label }) => commands::show_status(label),
        Some(Commands::Items { json }) => commands::show_items(json),
        Some(Commands::Countdown { created, extra }) => {
            commands::show_countdown(created.as_deref(), *extra, ctx).await?
        }
        Some(Commands::Hours) => commands::show_hours(ctx).await,
        Some(Commands::Config) => commands::show_settings(ctx).await,
        Some(Commands::Prep { minutes }) => commands::set_prep_time(*minutes, ctx).await?,
        Some(Commands::Exit) => {
            commands::exit()?;
            return Ok(true);
        }
        None => {}
    }
    Ok(false)
}
