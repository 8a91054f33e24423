//! Daily note commands

use notehub_core::daily::{DailyNote, DailyNotes, parse_date};
use notehub_core::transport::HttpTransport;

use crate::cli::{Session, report};

fn daily_notes(session: &Session) -> DailyNotes<HttpTransport> {
    DailyNotes::new(session.store.clone(), &session.config.daily_folder)
}

fn print_note(note: &DailyNote) {
    println!("{}  ({})", note.date.format("%A, %B %-d, %Y"), note.path);
    let body = note.body();
    if body.is_empty() {
        println!("  (no entries)");
    } else {
        for line in body.lines() {
            println!("  {}", line);
        }
    }
}

pub async fn handle_today(session: &Session) -> bool {
    match daily_notes(session).today().await {
        Ok(note) => {
            print_note(&note);
            true
        }
        Err(e) => {
            report(&e);
            false
        }
    }
}

pub async fn handle_daily(session: &Session, days: Option<usize>, date: Option<String>) -> bool {
    let notes = daily_notes(session);

    if let Some(date) = date {
        let date = match parse_date(&date) {
            Ok(date) => date,
            Err(e) => {
                report(&e);
                return false;
            }
        };
        return match notes.get_or_create(date).await {
            Ok(note) => {
                print_note(&note);
                true
            }
            Err(e) => {
                report(&e);
                false
            }
        };
    }

    let days = days.unwrap_or(session.config.recent_days);
    match notes.list_recent(days).await {
        Ok(recent) => {
            for (i, note) in recent.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                print_note(note);
            }
            true
        }
        Err(e) => {
            report(&e);
            false
        }
    }
}

pub async fn handle_append(session: &Session, text: &str) -> bool {
    match daily_notes(session).append(text).await {
        Ok(note) => {
            println!("✓ Appended to {}", note.path);
            true
        }
        Err(e) => {
            report(&e);
            false
        }
    }
}
