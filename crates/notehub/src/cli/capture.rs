//! `capture`: feed stdin into an autosaved document.
//!
//! Each input line is appended to the note and handed to the autosave
//! controller, which commits once input has paused for the debounce
//! interval. At end of input the document is flushed and closed.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use notehub_core::transport::Transport;
use notehub_core::{NotehubError, Result};
use notehub_core::autosave::{
    AutosaveController, AutosaveEvent, ConflictResolution, spawn_autosave,
};

use crate::cli::files::short;
use crate::cli::{Session, report};

pub async fn handle_capture(session: &Session, path: &str, on_conflict: ConflictResolution) -> bool {
    let controller = Arc::new(AutosaveController::with_debounce(
        session.store.clone(),
        session.config.autosave_debounce(),
    ));
    controller.subscribe(Arc::new(|event: &AutosaveEvent| match event {
        AutosaveEvent::Saved {
            path,
            version_token,
        } => eprintln!("  saved {} ({})", path, short(version_token.as_str())),
        AutosaveEvent::Conflict { path } => eprintln!("  ! {} changed remotely", path),
        AutosaveEvent::SaveFailed { message, .. } => eprintln!("  ! save failed: {}", message),
        AutosaveEvent::StateChanged { .. } => {}
    }));

    let document = match controller.open(path).await {
        Ok(document) => document,
        Err(e) => {
            report(&e);
            return false;
        }
    };
    eprintln!("Capturing into {} (Ctrl-D to finish)", document.path);

    let driver = spawn_autosave(Arc::clone(&controller));
    let mut content = document.content;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut input_ok = true;

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if !content.is_empty() && !content.ends_with('\n') {
                    content.push('\n');
                }
                content.push_str(&line);
                content.push('\n');
                if let Err(e) = controller.edit(content.clone()) {
                    report(&e);
                    input_ok = false;
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                report(&NotehubError::Io(e));
                input_ok = false;
                break;
            }
        }
    }
    // Flush before stopping the driver so an in-flight save lands
    let mut result = controller.flush().await;
    driver.abort();
    if let Err(e) = &result
        && e.is_conflict()
    {
        result = settle_conflict(&controller, on_conflict).await;
    }

    let result = match result {
        Ok(()) => controller.close().await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => input_ok,
        Err(e) => {
            report(&e);
            // Nothing was saved; hand the text back rather than lose it
            if let Some(document) = controller.document() {
                eprintln!("  Unsaved text follows on stdout");
                print!("{}", document.content);
            }
            controller.discard();
            false
        }
    }
}

async fn settle_conflict<T: Transport>(
    controller: &AutosaveController<T>,
    resolution: ConflictResolution,
) -> Result<()> {
    match resolution {
        ConflictResolution::Skip => Err(NotehubError::Conflict(
            controller
                .document()
                .map(|document| document.path)
                .unwrap_or_default(),
        )),
        ConflictResolution::KeepLocal => {
            controller.resolve(resolution).await?;
            controller.flush().await
        }
        ConflictResolution::KeepRemote => {
            controller.resolve(resolution).await?;
            eprintln!("  Kept the remote version; captured text was dropped");
            Ok(())
        }
    }
}
