//! Bridge between the synchronous document and asynchronous generation.
//!
//! Every dispatch gets a fresh [`RequestToken`]. A completion is accepted only
//! while its token is still pending; a newer request that targets the same
//! existing layer aborts and forgets the older one.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, error, info};

use super::types::{AspectRatio, GenerateOptions, GenerationError, ImageGenerator};
use crate::doc::LayerId;

pub type RequestToken = u64;

/// Where a generated image lands once it arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationTarget {
    /// Add a new image layer.
    NewLayer,
    /// Replace the payload of an existing image layer.
    Replace(LayerId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
    pub target: GenerationTarget,
}

/// A finished request: the first generated buffer, or the failure.
#[derive(Debug)]
pub struct Completion {
    pub token: RequestToken,
    pub request: GenerationRequest,
    pub result: Result<Vec<u8>, GenerationError>,
}

/// An in-flight request: the generator call and the task that reports it.
struct Pending {
    target: GenerationTarget,
    work: AbortHandle,
    watcher: JoinHandle<()>,
}

impl Pending {
    fn abort(&self) {
        self.work.abort();
        self.watcher.abort();
    }
}

pub struct GenerationBridge {
    generator: Arc<dyn ImageGenerator>,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    pending: HashMap<RequestToken, Pending>,
    next_token: RequestToken,
}

impl GenerationBridge {
    #[must_use]
    pub fn new(generator: Arc<dyn ImageGenerator>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { generator, tx, rx, pending: HashMap::new(), next_token: 1 }
    }

    /// Spawn a generation request on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::NoRuntime`] when called outside a runtime.
    pub fn dispatch(&mut self, request: GenerationRequest) -> Result<RequestToken, GenerationError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| GenerationError::NoRuntime)?;

        if let GenerationTarget::Replace(_) = request.target {
            self.supersede(request.target);
        }

        let token = self.next_token;
        self.next_token += 1;

        let generator = Arc::clone(&self.generator);
        let tx = self.tx.clone();
        let target = request.target;
        let prompt = request.prompt.clone();
        let options = GenerateOptions { aspect_ratio: request.aspect_ratio, number_of_images: 1 };
        let work = runtime.spawn(async move { generator.generate_images(&prompt, &options).await });
        let work_abort = work.abort_handle();

        // A panicking generator still yields a completion.
        let watcher = runtime.spawn(async move {
            let result = match work.await {
                Ok(result) => result.and_then(|images| {
                    images
                        .into_iter()
                        .find(|bytes| !bytes.is_empty())
                        .ok_or(GenerationError::Empty)
                }),
                Err(e) if e.is_panic() => {
                    error!(token, "image generator panicked");
                    Err(GenerationError::ApiRequest("generator panicked".into()))
                }
                Err(_) => return,
            };
            if tx.send(Completion { token, request, result }).is_err() {
                debug!(token, "generation finished after bridge closed");
            }
        });

        info!(token, ?target, "generation dispatched");
        self.pending.insert(token, Pending { target, work: work_abort, watcher });
        Ok(token)
    }

    /// Next accepted completion without waiting.
    pub fn try_next(&mut self) -> Option<Completion> {
        while let Ok(completion) = self.rx.try_recv() {
            if self.accept(&completion) {
                return Some(completion);
            }
        }
        None
    }

    /// Wait for the next accepted completion. `None` when nothing is pending.
    pub async fn next(&mut self) -> Option<Completion> {
        while !self.pending.is_empty() {
            let completion = self.rx.recv().await?;
            if self.accept(&completion) {
                return Some(completion);
            }
        }
        None
    }

    /// Whether `token` is still awaiting its result.
    #[must_use]
    pub fn is_pending(&self, token: RequestToken) -> bool {
        self.pending.contains_key(&token)
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Abort and forget every in-flight request.
    pub fn cancel_all(&mut self) {
        for (token, pending) in self.pending.drain() {
            pending.abort();
            debug!(token, "generation cancelled");
        }
    }

    fn supersede(&mut self, target: GenerationTarget) {
        let stale: Vec<RequestToken> = self
            .pending
            .iter()
            .filter(|(_, p)| p.target == target)
            .map(|(token, _)| *token)
            .collect();
        for token in stale {
            if let Some(pending) = self.pending.remove(&token) {
                pending.abort();
                debug!(token, "generation superseded");
            }
        }
    }

    fn accept(&mut self, completion: &Completion) -> bool {
        if self.pending.remove(&completion.token).is_some() {
            return true;
        }
        debug!(token = completion.token, "stale generation result ignored");
        false
    }
}

impl Drop for GenerationBridge {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
#[path = "bridge_test.rs"]
mod tests;
