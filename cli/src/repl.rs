//! Line-oriented chat loop on stdin/stdout.

use anyhow::Result;
use chorus_application::{ChatSession, ReconcileError};
use chorus_domain::{Model, PendingSnapshot, TranscriptId};
use std::collections::HashSet;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Commands:
  <text>          ask every model
  /pick <model>   keep that model's answer
  /answers        show the current answers
  /show           print the transcript
  /new            start a new transcript
  /open <id>      resume a transcript
  /quit           exit";

/// Parsed input line.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Ask(String),
    Pick(Model),
    Answers,
    Show,
    New,
    Open(TranscriptId),
    Help,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Some(Command::Ask(line.to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    Some(match (name, arg) {
        ("pick", arg) if !arg.is_empty() => {
            let Ok(model) = arg.parse::<Model>();
            Command::Pick(model)
        }
        ("answers", _) => Command::Answers,
        ("show", _) => Command::Show,
        ("new", _) => Command::New,
        ("open", arg) if !arg.is_empty() => Command::Open(TranscriptId::from(arg)),
        ("help" | "?", _) => Command::Help,
        ("quit" | "exit" | "q", _) => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    })
}

fn print_answers(snapshots: &[PendingSnapshot]) {
    for snapshot in snapshots {
        println!();
        match (&snapshot.failure, snapshot.complete) {
            (Some(error), _) => println!("── {} (failed: {})", snapshot.model, error),
            (None, true) => println!("── {}", snapshot.model),
            (None, false) => println!("── {} (still answering)", snapshot.model),
        }
        if !snapshot.text.is_empty() {
            println!("{}", snapshot.text);
        }
    }
    println!();
}

/// Report each model as it settles, then print every answer.
async fn follow_answers(session: &ChatSession) {
    let aggregator = session.reconciler().aggregator().clone();
    let mut changes = aggregator.watch();
    let mut reported: HashSet<Model> = HashSet::new();

    loop {
        let snapshots = aggregator.snapshots();
        for snapshot in snapshots.iter().filter(|s| s.is_settled()) {
            if reported.insert(snapshot.model.clone()) {
                match &snapshot.failure {
                    Some(_) => eprintln!("  {} failed", snapshot.model),
                    None => eprintln!("  {} finished", snapshot.model),
                }
            }
        }
        if snapshots.iter().all(PendingSnapshot::is_settled) {
            print_answers(&snapshots);
            return;
        }

        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    return;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                eprintln!("  stopped waiting; /answers shows partial answers");
                return;
            }
        }
    }
}

fn report(error: &ReconcileError) {
    tracing::debug!("{}", error);
    eprintln!("{}", error.user_message());
}

pub async fn run(mut session: ChatSession) -> Result<()> {
    let participants: Vec<String> = session
        .reconciler()
        .participants()
        .iter()
        .map(|m| m.to_string())
        .collect();
    println!("chorus: {}", participants.join(", "));
    println!(
        "transcript {} (type /help for commands)",
        session.reconciler().transcript().id()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(command) = parse_command(&line) else {
            continue;
        };

        match command {
            Command::Ask(text) => match session.reconciler_mut().submit(&text).await {
                Ok(_) => follow_answers(&session).await,
                // The question went out; only the save failed.
                Err(e @ ReconcileError::StoreWrite(_)) => {
                    report(&e);
                    follow_answers(&session).await;
                }
                Err(e) => report(&e),
            },
            Command::Pick(model) => match session.reconciler_mut().select(&model).await {
                Ok(resolution) => {
                    println!("kept {}'s answer", resolution.model);
                }
                Err(e) => report(&e),
            },
            Command::Answers => print_answers(&session.reconciler().snapshots()),
            Command::Show => {
                let transcript = session.reconciler().transcript();
                println!("transcript {}", transcript.id());
                for turn in transcript.turns() {
                    println!("[{}] {}", turn.role, turn.text);
                }
            }
            Command::New => match session.reconciler_mut().new_transcript().await {
                Ok(transcript) => println!("transcript {}", transcript.id()),
                Err(e) => report(&e),
            },
            Command::Open(id) => match session.reconciler_mut().open(&id).await {
                Ok(transcript) => {
                    println!("transcript {} ({} turns)", id, transcript.turns().len())
                }
                Err(e) => report(&e),
            },
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
            Command::Unknown(input) => eprintln!("unknown command: {} (try /help)", input),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_a_question() {
        assert_eq!(
            parse_command("  what is rust? "),
            Some(Command::Ask("what is rust?".to_string()))
        );
        assert_eq!(parse_command("   "), None);
    }

    #[test]
    fn test_pick_parses_model() {
        assert_eq!(
            parse_command("/pick gpt-4o-mini"),
            Some(Command::Pick(Model::Gpt4oMini))
        );
        assert!(matches!(
            parse_command("/pick"),
            Some(Command::Unknown(_))
        ));
    }

    #[test]
    fn test_open_and_quit() {
        assert_eq!(
            parse_command("/open abc-123"),
            Some(Command::Open(TranscriptId::from("abc-123")))
        );
        assert_eq!(parse_command("/q"), Some(Command::Quit));
    }
}
