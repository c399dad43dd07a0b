use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use clinic_app::config::render_error;
use clinic_app::{AppConfig, Command, CommandError, Flow, Route, Shell};
use clinic_core::SystemClock;
use clinic_infra::SupabaseClient;

#[derive(Parser)]
#[command(name = "clinic")]
#[command(about = "CLINICA PITICOS - gestão de pacientes no terminal")]
struct Cli {
    /// First route to open, e.g. /pacientes (overrides CLINIC_START_PATH)
    #[arg(long)]
    start: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    clinic_observability::init();
    let cli = Cli::parse();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "configuration error");
            print!("{}", render_error(&err));
            return Ok(());
        }
    };

    let start = Route::parse(cli.start.as_deref().unwrap_or(&config.start_path));
    tracing::info!(url = %config.supabase_url, %start, "starting");
    let client = Arc::new(SupabaseClient::new(config.supabase_url, config.anon_key));
    let mut shell = Shell::new(client.clone(), client, Arc::new(SystemClock), start);
    shell.start().await;

    let mut session = shell.session().watch();
    let mut routes = shell.navigator().subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut shown = show(&shell, None)?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                match Command::parse(&line) {
                    Ok(command) => {
                        if shell.execute(command).await == Flow::Quit {
                            break;
                        }
                    }
                    Err(CommandError::Empty) => {}
                    Err(err) => shell.notify(err.to_string()),
                }
                shown = show(&shell, None)?;
            }
            Ok(()) = session.changed() => {
                shell.refresh().await;
                shown = show(&shell, Some(&shown))?;
            }
            Ok(()) = routes.changed() => {
                shell.refresh().await;
                shown = show(&shell, Some(&shown))?;
            }
        }
    }

    shell.shutdown();
    tracing::info!("bye");
    Ok(())
}

/// Print the current screen unless it matches `previous`.
fn show(shell: &Shell, previous: Option<&str>) -> anyhow::Result<String> {
    let screen = shell.render();
    if previous != Some(screen.as_str()) {
        let mut stdout = std::io::stdout().lock();
        write!(stdout, "\n{screen}\n> ").context("writing screen")?;
        stdout.flush().context("writing screen")?;
    }
    Ok(screen)
}
