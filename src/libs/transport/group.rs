use super::{Tag, Transport};
use crate::libs::error::GroupError;

/// Index and value of the maximum; the lowest index wins a tie and NaN
/// counts as `-inf`.
///
/// ```
/// use psma::libs::transport::max_loc;
///
/// assert_eq!(max_loc(&[1.0, 5.0, 5.0, 2.0]), (5.0, 1));
/// assert_eq!(max_loc(&[f64::NAN, f64::NEG_INFINITY]), (f64::NEG_INFINITY, 0));
/// ```
pub fn max_loc(scores: &[f64]) -> (f64, usize) {
    let mut best = (f64::NEG_INFINITY, 0);
    for (rank, &score) in scores.iter().enumerate() {
        let score = if score.is_nan() {
            f64::NEG_INFINITY
        } else {
            score
        };
        if score > best.0 {
            best = (score, rank);
        }
    }
    best
}

/// The process group of one run: a transport plus the collectives every
/// rank calls in the same order.
///
/// All collectives are rooted at the leader (rank 0).
pub struct ProcessGroup {
    transport: Box<dyn Transport>,
}

impl ProcessGroup {
    pub fn new<T: Transport + 'static>(transport: T) -> Self {
        Self {
            transport: Box::new(transport),
        }
    }

    pub fn rank(&self) -> usize {
        self.transport.rank()
    }

    pub fn size(&self) -> usize {
        self.transport.size()
    }

    pub fn is_leader(&self) -> bool {
        self.rank() == 0
    }

    pub fn send(&self, dest: usize, tag: Tag, payload: Vec<u8>) -> Result<(), GroupError> {
        self.transport.send(dest, tag, payload)
    }

    pub fn recv(
        &self,
        source: Option<usize>,
        tags: &[Tag],
    ) -> Result<super::Envelope, GroupError> {
        self.transport.recv(source, tags)
    }

    pub fn abort(&self, reason: &str) {
        self.transport.abort(reason)
    }

    fn peers(&self) -> impl Iterator<Item = usize> {
        1..self.size()
    }

    /// Returns once every rank entered the barrier.
    pub fn barrier(&self) -> Result<(), GroupError> {
        if self.is_leader() {
            for _ in self.peers() {
                self.recv(None, &[Tag::Barrier])?;
            }
            for peer in self.peers() {
                self.send(peer, Tag::Release, vec![])?;
            }
        } else {
            self.send(0, Tag::Barrier, vec![])?;
            self.recv(Some(0), &[Tag::Release])?;
        }
        Ok(())
    }

    /// Global maximum of `score` and the lowest rank holding it.
    pub fn reduce_max_loc(&self, score: f64) -> Result<(f64, usize), GroupError> {
        if self.is_leader() {
            let mut scores = vec![f64::NEG_INFINITY; self.size()];
            scores[0] = score;
            for _ in self.peers() {
                let msg = self.recv(None, &[Tag::Reduce])?;
                scores[msg.source] = self.decode_f64(msg.source, &msg.payload)?;
            }
            let (best, rank) = max_loc(&scores);

            let mut reply = best.to_le_bytes().to_vec();
            reply.extend_from_slice(&(rank as u64).to_le_bytes());
            for peer in self.peers() {
                self.send(peer, Tag::Reduce, reply.clone())?;
            }
            Ok((best, rank))
        } else {
            self.send(0, Tag::Reduce, score.to_le_bytes().to_vec())?;
            let msg = self.recv(Some(0), &[Tag::Reduce])?;
            if msg.payload.len() != 16 {
                return Err(self.malformed(0, "reduce result"));
            }
            let best = self.decode_f64(0, &msg.payload[..8])?;
            let rank = self.decode_u64(0, &msg.payload[8..])? as usize;
            Ok((best, rank))
        }
    }

    /// Every rank gets a copy of `root`'s `buf`; other ranks pass an empty
    /// buffer. The length travels first and the payload is checked against it.
    pub fn broadcast_buffer(&self, root: usize, buf: Vec<u8>) -> Result<Vec<u8>, GroupError> {
        if root >= self.size() {
            return Err(GroupError::desync(
                self.rank(),
                format!("broadcast root {} outside the group", root),
            ));
        }

        if self.rank() == root {
            let len = (buf.len() as u64).to_le_bytes().to_vec();
            for dest in (0..self.size()).filter(|&r| r != root) {
                self.send(dest, Tag::Broadcast, len.clone())?;
                self.send(dest, Tag::Broadcast, buf.clone())?;
            }
            return Ok(buf);
        }

        let len = self.recv(Some(root), &[Tag::Broadcast])?;
        let len = self.decode_u64(root, &len.payload)? as usize;
        let payload = self.recv(Some(root), &[Tag::Broadcast])?.payload;
        if payload.len() != len {
            return Err(GroupError::desync(
                self.rank(),
                format!(
                    "broadcast from rank {} announced {} bytes, got {}",
                    root,
                    len,
                    payload.len()
                ),
            ));
        }
        Ok(payload)
    }

    fn malformed(&self, source: usize, what: &str) -> GroupError {
        GroupError::desync(
            self.rank(),
            format!("malformed {} from rank {}", what, source),
        )
    }

    fn decode_f64(&self, source: usize, bytes: &[u8]) -> Result<f64, GroupError> {
        let bytes: [u8; 8] = bytes
            .try_into()
            .map_err(|_| self.malformed(source, "score"))?;
        Ok(f64::from_le_bytes(bytes))
    }

    fn decode_u64(&self, source: usize, bytes: &[u8]) -> Result<u64, GroupError> {
        let bytes: [u8; 8] = bytes
            .try_into()
            .map_err(|_| self.malformed(source, "length"))?;
        Ok(u64::from_le_bytes(bytes))
    }
}
