//! Scripted session driver: spins an in-process room, runs a short planning
//! round, and prints the view models the engine emits.

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use host_sync::{InMemoryHost, InMemoryRoom};
use poll_core::{PollSession, ViewModel};
use shared::domain::Answer;
use tokio::time::timeout;
use tracing::info;

mod config;

#[derive(Parser, Debug)]
struct Cli {
    /// Settings file (TOML); env vars POKER_PARTICIPANTS / POKER_STORIES
    /// override individual fields.
    #[arg(long, default_value = "poker.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a scripted voting round and print the resulting views.
    Simulate,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let settings = config::load_settings(&cli.config);

    match cli.command {
        Command::Simulate => simulate(settings).await,
    }
}

async fn simulate(settings: config::Settings) -> Result<()> {
    if settings.participant_names.is_empty() {
        return Err(anyhow!("at least one participant is required"));
    }
    if settings.story_texts.is_empty() {
        return Err(anyhow!("at least one story is required"));
    }

    let room = InMemoryRoom::new();
    let mut sessions: Vec<Arc<PollSession>> = Vec::new();
    for name in &settings.participant_names {
        let host: Arc<InMemoryHost> = room.join(name.clone(), None).await;
        let session = PollSession::new(host);
        session
            .start()
            .await
            .map_err(|err| anyhow!("failed to start session for {name}: {err}"))?;
        sessions.push(session);
    }
    let moderator = &sessions[0];

    let mut story_ids = Vec::new();
    for text in &settings.story_texts {
        story_ids.push(moderator.create_story(text).await);
    }
    let first_story = story_ids[0];
    moderator.activate_story(first_story).await;

    for (session, name) in sessions.iter().zip(&settings.participant_names) {
        wait_for_view(session, |view| {
            view.active_story.as_ref().map(|s| s.id) == Some(first_story)
        })
        .await
        .with_context(|| format!("{name} never saw the active story"))?;
    }

    // Round-robin through a fixed answer script; the moderator then changes
    // their mind and finally toggles their vote away.
    let script = [Answer::Five, Answer::Eight, Answer::Five, Answer::Unknown];
    for (session, answer) in sessions.iter().zip(script.iter().cycle()) {
        session.answer(*answer).await;
    }
    sessions
        .last()
        .ok_or_else(|| anyhow!("no sessions"))?
        .set_status("needs a spike first")
        .await;

    let expected = sessions.len();
    let view = wait_for_view(moderator, |view| view.total_votes == expected)
        .await
        .context("votes never converged")?;
    info!(total_votes = view.total_votes, "all votes in");
    print_view("after everyone voted", &view)?;

    moderator.answer(Answer::Coffee).await;
    let view = wait_for_view(moderator, |view| {
        view.tally.bucket(Answer::Coffee).len() == 1
    })
    .await
    .context("changed vote never converged")?;
    print_view("after the moderator switched to coffee", &view)?;

    moderator.answer(Answer::Coffee).await;
    let view = wait_for_view(moderator, |view| view.total_votes == expected - 1)
        .await
        .context("toggle-off never converged")?;
    print_view("after the moderator toggled off", &view)?;

    Ok(())
}

async fn wait_for_view(
    session: &PollSession,
    predicate: impl Fn(&ViewModel) -> bool,
) -> Result<ViewModel> {
    timeout(Duration::from_secs(5), async {
        loop {
            if let Some(view) = session.view().await {
                if predicate(&view) {
                    return view;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .map_err(|_| anyhow!("timed out waiting for a matching view"))
}

fn print_view(label: &str, view: &ViewModel) -> Result<()> {
    println!("--- {label} ---");
    println!("{}", serde_json::to_string_pretty(view)?);
    Ok(())
}
