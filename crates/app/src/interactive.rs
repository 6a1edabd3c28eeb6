//! Terminal rendition of the workshop.
//!
//! Lines typed at the prompt are secrets for the current section, or answers
//! while a distraction problem is showing. Problems can appear at any moment,
//! so input is raced against a short poll of the scheduler.

use std::time::Duration;

use services::{AdvanceOutcome, AppServices, PersistenceStatus, SessionController};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use workshop_core::distraction::AnswerOutcome;
use workshop_core::model::{LeaderboardEntryDraft, ProblemId, Section, Stage};

const POLL: Duration = Duration::from_millis(250);

type Input = Lines<BufReader<Stdin>>;

/// How a section presents its secret in a terminal.
fn clue(section: &Section) -> String {
    let secret = section.secret();
    match section.id().as_str() {
        "hearing" => {
            let spelled: Vec<String> = secret.chars().map(|c| c.to_string()).collect();
            format!("The narrator spells it out: {}", spelled.join(", "))
        }
        "vision" => {
            let reversed: String = secret.chars().rev().collect();
            format!("A mirrored sign reads: {reversed}")
        }
        "motor" => {
            let keys: String = secret.chars().map(|c| format!("[{c}]")).collect();
            format!("The keys light up one after another: {keys}")
        }
        _ => format!("Stay focused. The word is {secret}, but expect interruptions."),
    }
}

enum Event {
    Line(String),
    Eof,
    Tick,
}

async fn next_event(input: &mut Input) -> std::io::Result<Event> {
    tokio::select! {
        line = input.next_line() => Ok(line?.map_or(Event::Eof, Event::Line)),
        () = tokio::time::sleep(POLL) => Ok(Event::Tick),
    }
}

async fn read_line(input: &mut Input) -> std::io::Result<Option<String>> {
    input.next_line().await
}

fn print_help() {
    println!("Commands: :start and :stop control distractions, :reset starts over, :quit exits.");
}

fn print_section(session: &SessionController) {
    let Some(section) = session.current_section() else {
        return;
    };
    let progress = session.progress();
    println!();
    println!(
        "== {} ({}/{}) ==",
        section.title(),
        progress.completed + 1,
        progress.total
    );
    println!("{}", clue(section));
    println!("Type the secret word to unlock the next section.");
}

pub(crate) async fn play(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let workshop = services.workshop();
    let mut input: Input = BufReader::new(tokio::io::stdin()).lines();

    println!("Welcome to the accessibility workshop.");
    println!("Each section hides a secret word. Find it to move on.");
    print_help();
    println!("Press Enter to begin.");
    if read_line(&mut input).await?.is_none() {
        return Ok(());
    }

    let mut session = workshop.start_session()?;
    print_section(&session);
    let mut shown: Option<ProblemId> = None;

    loop {
        match session.current_problem() {
            Some(problem) if shown != Some(problem.id()) => {
                println!();
                println!("!! Interruption: {}", problem.question());
                println!("!! Answer it before submitting the secret.");
                shown = Some(problem.id());
            }
            None => shown = None,
            Some(_) => {}
        }

        let line = match next_event(&mut input).await? {
            Event::Tick => continue,
            Event::Eof => break,
            Event::Line(line) => line,
        };
        let text = line.trim();

        match text {
            "" => continue,
            ":quit" => break,
            ":help" => print_help(),
            ":reset" => {
                workshop.reset_session(&mut session);
                println!("Progress cleared.");
                session.start();
                shown = None;
                print_section(&session);
            }
            ":start" => match workshop.start_distraction(&session) {
                Ok(()) => println!("Distractions on."),
                Err(err) => println!("{err}"),
            },
            ":stop" => {
                workshop.stop_distraction(&session);
                println!("Distractions paused.");
            }
            _ if session.current_problem().is_some() => {
                match workshop.submit_distraction_answer(&session, text) {
                    AnswerOutcome::Correct => {
                        println!("Correct. Score: {}", session.distraction_score());
                        shown = None;
                    }
                    AnswerOutcome::Incorrect => println!("Not quite. Try again."),
                    AnswerOutcome::NothingPending => {}
                }
            }
            _ => {
                let Some(section_id) = session.current_section().map(|s| s.id().clone()) else {
                    break;
                };
                let result = workshop.submit_secret(&mut session, &section_id, text).await?;
                if let PersistenceStatus::Failed(reason) = &result.persistence {
                    println!("(could not save progress: {reason})");
                }
                match result.outcome {
                    AdvanceOutcome::Accepted if result.is_complete => break,
                    AdvanceOutcome::Accepted => {
                        println!("Unlocked!");
                        print_section(&session);
                    }
                    AdvanceOutcome::Rejected => println!("That is not the secret. Try again."),
                    AdvanceOutcome::Blocked => {
                        println!("Answer the interruption first.");
                    }
                }
            }
        }
    }

    if session.stage() == Stage::Complete {
        finish(services, &mut session, &mut input).await?;
    }
    Ok(())
}

async fn finish(
    services: &AppServices,
    session: &mut SessionController,
    input: &mut Input,
) -> Result<(), Box<dyn std::error::Error>> {
    let score = session.distraction_score();
    println!();
    println!("All sections complete. Distractions answered: {score}");

    if session.record_id().is_none() {
        match services.workshop().finalize_record(session).await {
            Ok(id) => println!("Run saved as record {id}."),
            Err(err) => println!("Run could not be saved: {err}"),
        }
    }

    println!("Name for the leaderboard (leave blank to skip):");
    let Some(name) = read_line(input).await?.filter(|n| !n.trim().is_empty()) else {
        return Ok(());
    };
    println!("Email:");
    let email = read_line(input).await?.unwrap_or_default();

    let draft = LeaderboardEntryDraft::new(name, email, score.to_string());
    match services.leaderboard().submit(draft).await {
        Ok(entry) => println!("Added to the leaderboard as entry {}.", entry.id),
        Err(err) => println!("Leaderboard entry rejected: {err}"),
    }
    Ok(())
}
