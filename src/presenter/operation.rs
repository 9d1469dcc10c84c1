use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Holds the single live run of one kind of background operation.
///
/// Every run gets a ticket; results tagged with an older ticket belong to a
/// run that has been replaced and must be ignored.
pub struct OperationSlot {
    name: &'static str,
    ticket: u64,
    token: Option<CancellationToken>,
}

impl OperationSlot {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            ticket: 0,
            token: None,
        }
    }

    /// Cancels the current run, if any, and issues the ticket and token of
    /// its replacement. The token is a child of `parent`.
    pub fn replace(&mut self, parent: &CancellationToken) -> (u64, CancellationToken) {
        self.cancel();
        self.ticket += 1;
        let token = parent.child_token();
        self.token = Some(token.clone());
        (self.ticket, token)
    }

    pub fn cancel(&mut self) {
        if let Some(token) = self.token.take() {
            if !token.is_cancelled() {
                log::debug!("cancelling {} #{}", self.name, self.ticket);
            }
            token.cancel();
        }
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        self.ticket == ticket && self.token.as_ref().is_some_and(|t| !t.is_cancelled())
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Runs `work` on the runtime until it finishes or `token` is cancelled.
pub fn spawn_cancellable<F>(token: CancellationToken, name: &'static str, work: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => log::debug!("{} abandoned", name),
            _ = work => {}
        }
    });
}
