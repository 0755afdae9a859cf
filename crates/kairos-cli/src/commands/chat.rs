//! Line-based chat loop.
//!
//! Each stdin line is one chat message. The tick driver runs in the
//! background; phase changes are printed as they happen and journaled to
//! the database.

use kairos_core::{
    ChannelSink, Config, CoreError, Database, FanOutSink, NotificationSink, SessionJournal,
    TickDriver, UserId,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{assistant, resolve_user, CliResult};
use crate::render;

pub async fn run(user: Option<String>) -> CliResult {
    let config = Config::load()?;
    let user = resolve_user(user, &config);
    let db = Arc::new(Database::open()?);

    let (printer, mut printed) = ChannelSink::new();
    let (journal_sink, journal_rx) = ChannelSink::new();
    let sink = FanOutSink::new(vec![
        Arc::new(printer) as Arc<dyn NotificationSink>,
        Arc::new(journal_sink) as Arc<dyn NotificationSink>,
    ]);
    let journal = SessionJournal::new(Arc::clone(&db)).spawn(journal_rx);
    let notifier = tokio::spawn(async move {
        while let Some(note) = printed.recv().await {
            if let Some(line) = render::notification(&note) {
                println!("{line}");
            }
        }
    });

    let assistant = assistant(db, &config, Arc::new(sink))?;
    let driver = TickDriver::new(Arc::clone(assistant.pomodoro()), config.tick_interval()).spawn();
    tracing::info!(user = %user, "chat session started");
    println!("Kairos ready. Type /help for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match assistant.handle_message(&user, &line).await {
            Ok(reply) => println!("{}", render::reply(&reply)),
            Err(e) => println!("Error: {e}"),
        }
    }

    driver.shutdown().await;
    stop_open_session(&assistant, &user).await;
    // The assistant owns the last senders; dropping it ends both consumers.
    drop(assistant);
    if let Err(e) = notifier.await {
        tracing::warn!(error = %e, "notification printer failed");
    }
    if let Err(e) = journal.await {
        tracing::warn!(error = %e, "session journal failed");
    }
    Ok(())
}

/// Closes the journal row of a session still running at end of input.
async fn stop_open_session(assistant: &super::CliAssistant, user: &UserId) {
    match assistant.pomodoro_stop(user).await {
        Ok(_) | Err(CoreError::NoActiveSession) => {}
        Err(e) => tracing::warn!(user = %user, error = %e, "failed to stop session on exit"),
    }
}
