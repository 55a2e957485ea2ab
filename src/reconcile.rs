use crate::event::{Event, EventState};

/// The three lists handed to the renderer. `all` is always pending rows
/// followed by mined rows, both sorted descending by (block number, log index).
#[derive(Debug, Clone, Default)]
pub struct EventLists {
    pub mined: Vec<Event>,
    pub pending: Vec<Event>,
    pub all: Vec<Event>,
}

impl EventLists {
    pub fn new() -> Self {
        Default::default()
    }

    /// Folds a batch of freshly decoded events into the current lists.
    ///
    /// New mined events arrive newest-first from the subscription, so they are
    /// reversed back to chronological order before being prepended. A prior
    /// pending event is dropped once the batch supersedes it: either a mined
    /// event with the same transaction hash showed up, or the same pending
    /// notification (same content key) was delivered again. Duplicates are
    /// only ever removed through that supersession rule.
    ///
    /// An empty batch leaves every list untouched.
    pub fn reconcile(&mut self, batch: &[Event]) {
        if batch.is_empty() {
            return;
        }

        let mut mined: Vec<Event> = batch
            .iter()
            .rev()
            .filter(|event| event.state == EventState::Mined)
            .cloned()
            .collect();
        mined.extend(self.mined.iter().cloned());
        mined.sort_by(Event::display_order);

        let mut pending: Vec<Event> = batch
            .iter()
            .rev()
            .filter(|event| event.state == EventState::Pending)
            .cloned()
            .collect();
        pending.extend(
            self.pending
                .iter()
                .filter(|prior| !superseded(batch, prior))
                .cloned(),
        );
        pending.sort_by(Event::display_order);

        let mut all = pending.clone();
        all.extend(mined.iter().cloned());

        self.mined = mined;
        self.pending = pending;
        self.all = all;
    }
}

/// A prior pending event is superseded when the batch carries a mined event
/// for the same transaction, or re-delivers the same pending notification.
fn superseded(batch: &[Event], prior: &Event) -> bool {
    batch.iter().any(|event| {
        let mined_same_tx = event.state == EventState::Mined
            && event.transaction_hash == prior.transaction_hash;
        let pending_same_key = event.state == EventState::Pending && event.key == prior.key;
        mined_same_tx || pending_same_key
    })
}
