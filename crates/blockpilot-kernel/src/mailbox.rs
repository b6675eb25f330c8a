//! [`Mailbox`] – a single-slot, overwrite-newest handoff.
//!
//! The scheduler and a behavior task exchange exactly one value per direction
//! per tick.  Only the newest value matters, so a put replaces whatever the
//! reader has not collected yet.

use std::sync::Mutex;

use tokio::sync::Notify;

pub struct Mailbox<T> {
    slot: Mutex<Option<T>>,
    notify: Notify,
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            notify: Notify::new(),
        }
    }

    /// Store `value`, dropping any value not yet taken, and wake the reader.
    pub fn put(&self, value: T) {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(value);
        self.notify.notify_one();
    }

    /// Remove the stored value without waiting.
    pub fn take(&self) -> Option<T> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).take()
    }

    /// Wait until a value is available and remove it.
    pub async fn recv(&self) -> T {
        loop {
            if let Some(value) = self.take() {
                return value;
            }
            // notify_one leaves a permit when nobody is waiting, so a put that
            // lands between take() and here is not lost.
            self.notify.notified().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn put_overwrites_unread_value() {
        let mailbox = Mailbox::new();
        mailbox.put(1);
        mailbox.put(2);
        assert_eq!(mailbox.take(), Some(2));
        assert_eq!(mailbox.take(), None);
    }

    #[tokio::test]
    async fn recv_waits_for_put() {
        let mailbox = Arc::new(Mailbox::new());
        let reader = {
            let mailbox = Arc::clone(&mailbox);
            tokio::spawn(async move { mailbox.recv().await })
        };
        tokio::task::yield_now().await;
        mailbox.put("hello");
        let got = tokio::time::timeout(Duration::from_secs(1), reader)
            .await
            .expect("reader finished")
            .expect("reader did not panic");
        assert_eq!(got, "hello");
    }

    #[tokio::test]
    async fn recv_returns_immediately_when_full() {
        let mailbox = Mailbox::new();
        mailbox.put(7u32);
        assert_eq!(mailbox.recv().await, 7);
    }
}
