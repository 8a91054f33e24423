//! Timer task that drives an [`AutosaveController`].

use std::sync::Arc;

use tokio::task::JoinHandle;

use super::AutosaveController;
use crate::transport::Transport;

/// Spawn a task that saves the controller's document whenever its
/// debounce deadline passes.
///
/// The task sleeps until the next deadline and is woken by every edit, so
/// a burst of edits produces one save. Failed saves are logged; the
/// controller re-arms the deadline for transient failures. Abort the
/// returned handle to stop the task (flush the controller first).
pub fn spawn_autosave<T>(controller: Arc<AutosaveController<T>>) -> JoinHandle<()>
where
    T: Transport + 'static,
{
    tokio::spawn(async move {
        loop {
            match controller.next_deadline() {
                Some(deadline) => {
                    tokio::select! {
                        _ = tokio::time::sleep_until(deadline) => {
                            match controller.tick().await {
                                Ok(true) => {}
                                // A save is already running; it wakes us when done
                                Ok(false) => controller.wake.notified().await,
                                Err(e) => log::warn!("Autosave failed: {}", e),
                            }
                        }
                        _ = controller.wake.notified() => {}
                    }
                }
                None => controller.wake.notified().await,
            }
        }
    })
}
