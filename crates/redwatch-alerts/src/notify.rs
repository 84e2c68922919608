//! Fallback notices for alerts that exhausted their webhook retries.

use std::sync::Mutex;

use tracing::info;

/// What gets mailed to a tenant when webhook delivery gives up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureNotice {
    pub email: String,
    pub matched_phrase: String,
    pub community: String,
    pub url: String,
}

/// In-process queue of failure notices.
///
/// The dispatcher enqueues; the worker drains after each dispatch round
/// and logs each notice. No mailer is wired in — delivery transport
/// belongs to the deployment surface.
#[derive(Debug, Default)]
pub struct NoticeQueue {
    queue: Mutex<Vec<FailureNotice>>,
}

impl NoticeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, notice: FailureNotice) {
        info!(
            email = %notice.email,
            phrase = %notice.matched_phrase,
            community = %notice.community,
            "fallback notice queued"
        );
        self.queue.lock().unwrap().push(notice);
    }

    /// Take everything queued so far.
    pub fn drain(&self) -> Vec<FailureNotice> {
        std::mem::take(&mut *self.queue.lock().unwrap())
    }

    pub fn len(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_and_drain() {
        let queue = NoticeQueue::new();
        assert!(queue.is_empty());

        queue.enqueue(FailureNotice {
            email: "ops@example.com".into(),
            matched_phrase: "arbitrage".into(),
            community: "sportsbook".into(),
            url: "https://reddit.com/r/sportsbook/comments/abc".into(),
        });
        assert_eq!(queue.len(), 1);

        let drained = queue.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].email, "ops@example.com");
        assert!(queue.is_empty());
    }
}
