use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use awaitui_core::ports::RenderSurface;
use awaitui_core::{
    AsyncRenderManager, AsyncRenderProps, BuildError, ManagerBuilder, Rejecter, Rejection,
    RenderConfig, Resolver, Snapshot, SurfaceLoop, TaskId,
};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "awaitui", about = "Confirm a destructive action, three times over")]
struct Args {
    /// Delay between answering a dialog and removing it (ms). Overrides AWAITUI_CLEANUP_GRACE_MS.
    #[arg(long)]
    grace_ms: Option<u64>,

    /// Answer every dialog with "yes" instead of reading stdin.
    #[arg(long)]
    yes: bool,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Render(#[from] Rejection),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfirmationOutcome {
    Confirm,
}

struct ConfirmationProps {
    title: String,
}

/// The renderable: what the terminal shows, plus the way to answer it.
struct ConfirmationDialog {
    title: String,
    resolve: Resolver<ConfirmationOutcome>,
    reject: Rejecter<ConfirmationOutcome>,
}

impl ConfirmationDialog {
    fn new(props: AsyncRenderProps<ConfirmationProps, ConfirmationOutcome>) -> Self {
        let (props, resolve, reject) = props.into_parts();
        Self {
            title: props.title,
            resolve,
            reject,
        }
    }

    fn answer(&self, yes: bool) {
        if yes {
            self.resolve.resolve(ConfirmationOutcome::Confirm);
        } else {
            self.reject.reject();
        }
    }
}

/// Prompts on stdin for every dialog that becomes active.
struct TerminalSurface {
    assume_yes: bool,
    prompted: Mutex<HashSet<TaskId>>,
    stdin: tokio::sync::Mutex<Lines<BufReader<Stdin>>>,
}

impl TerminalSurface {
    fn new(assume_yes: bool) -> Self {
        Self {
            assume_yes,
            prompted: Mutex::new(HashSet::new()),
            stdin: tokio::sync::Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }

    async fn ask(&self, title: &str) -> bool {
        let mut stdout = tokio::io::stdout();
        let prompt = format!("\u{26a0} {title} [Continue = y / Cancel = n] ");
        if stdout.write_all(prompt.as_bytes()).await.is_err() || stdout.flush().await.is_err() {
            return false;
        }
        if self.assume_yes {
            if let Err(e) = stdout.write_all(b"y\n").await {
                warn!(error = %e, "failed to echo answer");
            }
            return true;
        }

        match self.stdin.lock().await.next_line().await {
            Ok(Some(line)) => matches!(line.trim(), "y" | "Y" | "yes"),
            // EOF or unreadable stdin closes the dialog like Escape would
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "failed to read answer");
                false
            }
        }
    }
}

#[async_trait]
impl RenderSurface<ConfirmationDialog> for TerminalSurface {
    async fn render(&self, snapshot: &Snapshot<ConfirmationDialog>) {
        for entry in snapshot.active() {
            let first_time = self
                .prompted
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .insert(entry.id);
            if first_time {
                let yes = self.ask(&entry.renderable.title).await;
                entry.renderable.answer(yes);
            }
        }
    }
}

fn ask(
    manager: &AsyncRenderManager<ConfirmationDialog>,
    title: &str,
) -> awaitui_core::RenderFuture<ConfirmationOutcome> {
    manager.render(
        ConfirmationDialog::new,
        ConfirmationProps {
            title: title.to_string(),
        },
    )
}

async fn destructive_action(
    manager: &AsyncRenderManager<ConfirmationDialog>,
) -> Result<(), Rejection> {
    ask(manager, "Are you sure?").await?;
    ask(manager, "Ok, but are you really sure?").await?;
    ask(manager, "I have to check just once more...").await?;
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    init_logging();
    let args = Args::parse();

    let mut config = RenderConfig::from_env()?;
    if let Some(ms) = args.grace_ms {
        config = config.with_cleanup_grace_period(Duration::from_millis(ms));
    }

    let manager: AsyncRenderManager<ConfirmationDialog> =
        ManagerBuilder::new().config(config).build()?;
    let surface = SurfaceLoop::new(&manager, TerminalSurface::new(args.yes)).spawn();

    let result = destructive_action(&manager).await;
    match &result {
        Ok(()) => info!("do the destructive action..."),
        // declined by the user: nothing to report
        Err(Rejection::Cancelled) => info!("operation cancelled"),
        Err(e) => error!(error = %e, "confirmation failed"),
    }

    // let the last dialog's grace period run out before tearing down
    tokio::time::sleep(manager.cleanup_grace_period()).await;
    info!(remaining = ?manager.counts(), "shutting down");
    manager.shutdown();
    if let Err(e) = surface.await {
        warn!(error = %e, "surface loop did not finish cleanly");
    }

    match result {
        Err(Rejection::Cancelled) | Ok(()) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
