use super::{Envelope, Mailbox, Tag, Transport};
use crate::libs::error::GroupError;
use std::sync::Arc;

/// A group whose ranks are threads of the current process.
///
/// ```
/// use psma::libs::transport::{LocalTransport, Tag, Transport};
///
/// let group = LocalTransport::group(2);
/// group[1].send(0, Tag::Work, vec![7]).unwrap();
/// let msg = group[0].recv(None, &[Tag::Work]).unwrap();
/// assert_eq!((msg.source, msg.payload), (1, vec![7]));
/// ```
pub struct LocalTransport {
    rank: usize,
    mailboxes: Arc<Vec<Mailbox>>,
}

impl LocalTransport {
    /// One transport per rank, sharing a set of mailboxes.
    pub fn group(size: usize) -> Vec<LocalTransport> {
        let mailboxes: Arc<Vec<Mailbox>> = Arc::new((0..size).map(|_| Mailbox::new()).collect());
        (0..size)
            .map(|rank| LocalTransport {
                rank,
                mailboxes: Arc::clone(&mailboxes),
            })
            .collect()
    }
}

impl Transport for LocalTransport {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.mailboxes.len()
    }

    fn send(&self, dest: usize, tag: Tag, payload: Vec<u8>) -> Result<(), GroupError> {
        let mailbox = self
            .mailboxes
            .get(dest)
            .ok_or_else(|| GroupError::desync(self.rank, format!("no rank {}", dest)))?;
        mailbox.deliver(Envelope {
            source: self.rank,
            tag,
            payload,
        });
        Ok(())
    }

    fn recv(&self, source: Option<usize>, tags: &[Tag]) -> Result<Envelope, GroupError> {
        self.mailboxes[self.rank]
            .take(source, tags)
            .map_err(|reason| GroupError::desync(self.rank, reason))
    }

    fn abort(&self, reason: &str) {
        let reason = format!("rank {} aborted: {}", self.rank, reason);
        for mailbox in self.mailboxes.iter() {
            mailbox.close(&reason);
        }
    }
}

impl Drop for LocalTransport {
    fn drop(&mut self) {
        // A rank thread unwinding would otherwise leave its peers blocked
        if std::thread::panicking() {
            self.abort("panic");
        }
    }
}
