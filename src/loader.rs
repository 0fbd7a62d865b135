//! Loading-state plumbing for the browse view's two fetches (jobs and
//! reference data). Each fetch is a single outstanding operation on a worker
//! thread: no retry, no timeout. If the view stops polling before the result
//! arrives, the channel send fails and the result is dropped, so nothing is
//! ever written into a torn-down view.

use std::sync::mpsc::{channel, Receiver};
use std::thread;

/// idle -> loading -> (ready | failed). Re-fetch is user-triggered only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState<T> {
    #[default]
    Idle,
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> LoadState<T> {
    pub fn error(&self) -> Option<&str> {
        match self {
            LoadState::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            LoadState::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Commit a finished fetch into this slot.
    pub fn settle(&mut self, result: anyhow::Result<T>) {
        *self = match result {
            Ok(value) => LoadState::Ready(value),
            Err(err) => LoadState::Failed(format!("{:#}", err)),
        };
    }
}

/// Run `fetch` on a worker thread and hand back the receiving end. The
/// caller polls with `try_recv` from its event loop; dropping the receiver
/// abandons the in-flight request cleanly.
pub fn spawn_fetch<T, F>(fetch: F) -> Receiver<anyhow::Result<T>>
where
    T: Send + 'static,
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
{
    let (tx, rx) = channel();
    thread::spawn(move || {
        // A send error just means nobody is listening anymore.
        let _ = tx.send(fetch());
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::time::Duration;

    #[test]
    fn test_settle_moves_to_ready_or_failed() {
        let mut state: LoadState<u32> = LoadState::Loading;
        state.settle(Ok(7));
        assert_eq!(state.ready(), Some(&7));

        let mut state: LoadState<u32> = LoadState::Loading;
        state.settle(Err(anyhow!("connection refused")));
        assert!(state.error().unwrap().contains("connection refused"));
        assert!(state.ready().is_none());
    }

    #[test]
    fn test_spawn_fetch_delivers_result() {
        let rx = spawn_fetch(|| Ok::<_, anyhow::Error>(vec![1, 2, 3]));
        let result = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("worker delivered");
        assert_eq!(result.unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_dropped_receiver_is_harmless() {
        let rx = spawn_fetch(|| {
            thread::sleep(Duration::from_millis(20));
            Ok::<_, anyhow::Error>(1)
        });
        drop(rx);
        // The worker's send fails silently; give it time to finish to make
        // sure nothing panics.
        thread::sleep(Duration::from_millis(60));
    }
}
