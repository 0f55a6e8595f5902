//! Civitas - Main Entry Point
//!
//! Loads settings, wires the engine to its adapters and runs a
//! line-oriented command loop on stdin.

mod commands;

use std::sync::Arc;

use civitas_application::{ApplicationError, Engine, IdentityProvider, RemoteActor};
use civitas_domain::{Post, Principal, generate_id};
use civitas_infrastructure::{
    HttpRemoteActor, InMemoryRemoteActor, LocalIdentityProvider, SettingsRepository, SystemClock,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use crate::commands::{Command, HELP};

/// Environment variable selecting the remote feed service.
const REMOTE_URL_ENV: &str = "CIVITAS_REMOTE_URL";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting Civitas v{}", env!("CARGO_PKG_VERSION"));

    let repository = SettingsRepository::new();
    let settings = repository.load().await?;
    info!(provider = %settings.identity_provider_url, "settings loaded");

    let principal = Principal::new(generate_id())?;
    let identity = Arc::new(LocalIdentityProvider::new(principal.clone()));
    let clock = Arc::new(SystemClock::new());

    match std::env::var(REMOTE_URL_ENV).ok().filter(|u| !u.trim().is_empty()) {
        Some(raw) => {
            let base_url = Url::parse(raw.trim())?;
            info!(%base_url, "using remote feed service");
            let remote = Arc::new(HttpRemoteActor::new(base_url)?);
            run(Engine::new(remote, identity, clock, &settings)?).await
        }
        None => {
            info!("using in-process feed store");
            let remote = Arc::new(InMemoryRemoteActor::new(clock.clone(), principal));
            run(Engine::new(remote, identity, clock, &settings)?).await
        }
    }
}

async fn run<R: RemoteActor, I: IdentityProvider>(
    engine: Engine<R, I, SystemClock>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(principal) = engine.start().await? {
        println!("restored session for {}", principal.short());
    }
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match commands::parse(&line) {
            Ok(command) => command,
            Err(commands::ParseError::Empty) => continue,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        if command == Command::Quit {
            break;
        }
        if let Err(e) = execute(&engine, command).await {
            report(&e);
        }
    }

    Ok(())
}

async fn execute<R: RemoteActor, I: IdentityProvider>(
    engine: &Engine<R, I, SystemClock>,
    command: Command,
) -> Result<(), ApplicationError> {
    match command {
        Command::Login => {
            println!("{}", engine.auth_state().message());
            let principal = engine.login().await?;
            println!("signed in as {}", principal.short());
            print_feed(&engine.feed().await);
        }
        Command::Logout => {
            engine.logout().await?;
            println!("signed out");
        }
        Command::Refresh => {
            let outcome = engine.refresh().await?;
            info!(?outcome, "refresh finished");
            print_feed(&engine.feed().await);
        }
        Command::Feed => {
            if !engine.auth_state().is_authenticated() {
                return Err(ApplicationError::NotAuthenticated);
            }
            print_feed(&engine.feed().await);
        }
        Command::Post { content, file_url } => {
            let id = engine.create_post(&content, &file_url).await?;
            println!("published post #{id}");
        }
        Command::Like { post_id } => {
            engine.like_post(post_id).await?;
            println!("liked post #{post_id}");
        }
        Command::Comment { post_id, text } => {
            let comment = engine.add_comment(post_id, &text).await?;
            println!("comment #{} added to post #{post_id}", comment.id);
        }
        Command::Status => {
            let state = engine.auth_state();
            match state.principal() {
                Some(principal) => println!("{} as {principal}", state.message()),
                None => println!("{}", state.message()),
            }
            println!("identity provider: {}", engine.provider_url());
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
    Ok(())
}

fn report(error: &ApplicationError) {
    let kind = error.kind();
    if !kind.is_local() {
        warn!(error = %error, "operation failed");
    }
    println!("{}: {error}", kind.title());
}

fn print_feed(posts: &[Post]) {
    if posts.is_empty() {
        println!("(no posts yet)");
        return;
    }
    for post in posts {
        println!(
            "#{} {} {} [{} likes]",
            post.id,
            post.author.short(),
            post.created_at.format("%Y-%m-%d %H:%M"),
            post.like_count
        );
        println!("    {}", post.content);
        if post.has_attachment() {
            println!("    file: {}", post.file_url);
        }
        for comment in &post.comments {
            println!("    > {}: {}", comment.author.short(), comment.text);
        }
    }
}
