//! One-shot append confirmation.
//!
//! An append is confirmed or fails exactly once. The sender half is consumed
//! by either terminal call, so a second notification cannot be expressed.

use dal_types::{EntryMeta, StorageLocation};
use tokio::sync::oneshot;

/// Terminal outcome of an append.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The log durably confirmed the entry.
    Confirmed(EntryMeta),
    /// The log reported an error instead of confirming.
    Failed(String),
}

impl AppendOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed(_))
    }
}

/// Create a linked sender/receiver pair for the append at `location`.
pub fn confirmation_channel(location: StorageLocation) -> (ConfirmationSender, Confirmation) {
    let (tx, rx) = oneshot::channel();
    (ConfirmationSender { tx }, Confirmation { location, rx })
}

/// Sending half, held by whoever will learn the outcome of the append.
#[derive(Debug)]
pub struct ConfirmationSender {
    tx: oneshot::Sender<AppendOutcome>,
}

impl ConfirmationSender {
    pub fn confirm(self, meta: EntryMeta) {
        self.resolve(AppendOutcome::Confirmed(meta));
    }

    pub fn fail(self, reason: impl Into<String>) {
        self.resolve(AppendOutcome::Failed(reason.into()));
    }

    pub fn resolve(self, outcome: AppendOutcome) {
        // Nobody listening is fine: interest in the outcome is optional.
        let _ = self.tx.send(outcome);
    }
}

/// Receiving half. Interest may be registered at any point: an outcome sent
/// before [`Confirmation::wait`] is called is retained.
#[derive(Debug)]
pub struct Confirmation {
    location: StorageLocation,
    rx: oneshot::Receiver<AppendOutcome>,
}

impl Confirmation {
    /// A confirmation that is already resolved.
    pub fn resolved(location: StorageLocation, outcome: AppendOutcome) -> Self {
        let (sender, confirmation) = confirmation_channel(location);
        sender.resolve(outcome);
        confirmation
    }

    /// Location of the append this confirmation belongs to.
    pub fn location(&self) -> &StorageLocation {
        &self.location
    }

    /// Wait for the outcome.
    ///
    /// A sender dropped without resolving is reported as a failure.
    pub async fn wait(self) -> AppendOutcome {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => AppendOutcome::Failed(format!(
                "confirmation for {} was abandoned by the storage",
                self.location
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> StorageLocation {
        StorageLocation::from("loc")
    }

    #[tokio::test]
    async fn confirm_is_delivered() {
        let (sender, confirmation) = confirmation_channel(loc());
        sender.confirm(EntryMeta::confirmed(7));
        assert_eq!(
            confirmation.wait().await,
            AppendOutcome::Confirmed(EntryMeta::confirmed(7))
        );
    }

    #[tokio::test]
    async fn outcome_sent_before_wait_is_kept() {
        let (sender, confirmation) = confirmation_channel(loc());
        sender.fail("boom");
        assert_eq!(confirmation.wait().await, AppendOutcome::Failed("boom".into()));
    }

    #[tokio::test]
    async fn dropped_sender_is_a_failure() {
        let (sender, confirmation) = confirmation_channel(loc());
        drop(sender);
        assert!(!confirmation.wait().await.is_confirmed());
    }

    #[tokio::test]
    async fn resolved_confirmation() {
        let confirmation =
            Confirmation::resolved(loc(), AppendOutcome::Confirmed(EntryMeta::confirmed(1)));
        assert_eq!(confirmation.location(), &loc());
        assert!(confirmation.wait().await.is_confirmed());
    }

    #[test]
    fn sending_without_receiver_does_not_panic() {
        let (sender, confirmation) = confirmation_channel(loc());
        drop(confirmation);
        sender.confirm(EntryMeta::confirmed(1));
    }
}
