//! Deterministic transports for tests.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

use futures::future::BoxFuture;
use lettre::Message;

use super::transport::{MailError, MailTransport};

/// Server reply and credential carried by the failing stub's error.
pub(crate) const REJECT_REPLY: &str = "535 5.7.8 smtp.example.com: authentication failed";
pub(crate) const LEAKED_SECRET: &str = "relay@example.com:hunter2";

enum Behaviour {
    Accept,
    Fail,
    Hang,
}

/// Records every message handed to it and answers with a fixed outcome.
pub(crate) struct StubTransport {
    behaviour: Behaviour,
    attempts: AtomicUsize,
    delivered: Mutex<Vec<Vec<u8>>>,
}

impl StubTransport {
    fn with(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            attempts: AtomicUsize::new(0),
            delivered: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn accepting() -> Self {
        Self::with(Behaviour::Accept)
    }

    pub(crate) fn failing() -> Self {
        Self::with(Behaviour::Fail)
    }

    /// Never completes; only a timeout gets the caller out.
    pub(crate) fn hanging() -> Self {
        Self::with(Behaviour::Hang)
    }

    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub(crate) fn last_message(&self) -> Option<Vec<u8>> {
        self.delivered.lock().unwrap().last().cloned()
    }
}

impl MailTransport for StubTransport {
    fn deliver(&self, message: Message) -> BoxFuture<'_, Result<(), MailError>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            match self.behaviour {
                Behaviour::Accept => {
                    self.delivered.lock().unwrap().push(message.formatted());
                    Ok(())
                }
                Behaviour::Fail => Err(MailError::Transport(format!(
                    "{REJECT_REPLY} (AUTH PLAIN {LEAKED_SECRET})"
                ))),
                Behaviour::Hang => {
                    futures::future::pending::<()>().await;
                    Ok(())
                }
            }
        })
    }
}
