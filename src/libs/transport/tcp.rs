use super::{Envelope, Mailbox, Tag, Transport};
use crate::libs::error::GroupError;
use crate::libs::sched::lock;
use std::io::{BufReader, Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

// tag u8, source u32, destination u32, payload length u32
const FRAME_HEADER_LEN: usize = 13;

const CONNECT_RETRIES: usize = 100;
const CONNECT_DELAY: Duration = Duration::from_millis(100);

struct Frame {
    tag: Tag,
    source: usize,
    dest: usize,
    payload: Vec<u8>,
}

fn write_frame(
    stream: &Mutex<TcpStream>,
    tag: Tag,
    source: usize,
    dest: usize,
    payload: &[u8],
) -> std::io::Result<()> {
    let len = u32::try_from(payload.len())
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidInput, "payload too large"))?;

    let mut buf = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
    buf.push(tag.to_u8());
    buf.extend_from_slice(&(source as u32).to_le_bytes());
    buf.extend_from_slice(&(dest as u32).to_le_bytes());
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(payload);

    let mut stream = lock(stream);
    stream.write_all(&buf)?;
    stream.flush()
}

/// `Ok(None)` on a clean end of stream between frames.
fn read_frame<R: Read>(reader: &mut R) -> std::io::Result<Option<Frame>> {
    let mut header = [0u8; FRAME_HEADER_LEN];
    match reader.read_exact(&mut header) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }

    let word = |at: usize| {
        let mut b = [0u8; 4];
        b.copy_from_slice(&header[at..at + 4]);
        u32::from_le_bytes(b) as usize
    };
    let tag = Tag::from_u8(header[0]).ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("unknown message tag {}", header[0]),
        )
    })?;

    let mut payload = vec![0u8; word(9)];
    reader.read_exact(&mut payload)?;
    Ok(Some(Frame {
        tag,
        source: word(1),
        dest: word(5),
        payload,
    }))
}

/// A group of OS processes connected in a star around the leader.
///
/// Rank 0 listens; every other rank connects to it and announces its rank.
/// Frames between two peers are relayed by the leader, which keeps the
/// per-pair ordering because each hop is a single ordered stream.
pub struct TcpTransport {
    rank: usize,
    size: usize,
    mailbox: Arc<Mailbox>,
    // Indexed by rank. The leader holds one stream per peer, a peer holds
    // only the leader's stream at index 0.
    streams: Arc<Vec<Option<Mutex<TcpStream>>>>,
}

impl TcpTransport {
    /// Join the group as `rank` of `size`, meeting at `addr`.
    pub fn join(rank: usize, size: usize, addr: &str) -> Result<Self, GroupError> {
        if size == 0 || rank >= size {
            return Err(GroupError::desync(
                rank,
                format!("rank {} outside a group of {}", rank, size),
            ));
        }
        if rank == 0 {
            Self::listen(size, addr)
        } else {
            Self::connect(rank, size, addr)
        }
    }

    fn listen(size: usize, addr: &str) -> Result<Self, GroupError> {
        let listener = TcpListener::bind(addr)?;
        log::debug!("rank 0 listening on {} for {} peer(s)", addr, size - 1);

        let mut slots: Vec<Option<TcpStream>> = (0..size).map(|_| None).collect();
        let mut joined = 1;
        while joined < size {
            let (mut stream, peer_addr) = listener.accept()?;
            stream.set_nodelay(true)?;

            let mut hello = [0u8; 4];
            stream.read_exact(&mut hello)?;
            let peer = u32::from_le_bytes(hello) as usize;
            if peer == 0 || peer >= size || slots[peer].is_some() {
                return Err(GroupError::desync(
                    0,
                    format!("unexpected hello from {} as rank {}", peer_addr, peer),
                ));
            }
            log::debug!("rank {} joined from {}", peer, peer_addr);
            slots[peer] = Some(stream);
            joined += 1;
        }

        let mut readers = vec![];
        let mut streams = vec![];
        for slot in slots {
            match slot {
                Some(stream) => {
                    readers.push(Some(stream.try_clone()?));
                    streams.push(Some(Mutex::new(stream)));
                }
                None => {
                    readers.push(None);
                    streams.push(None);
                }
            }
        }

        let transport = Self {
            rank: 0,
            size,
            mailbox: Arc::new(Mailbox::new()),
            streams: Arc::new(streams),
        };

        for (peer, reader) in readers.into_iter().enumerate() {
            if let Some(reader) = reader {
                let mailbox = Arc::clone(&transport.mailbox);
                let streams = Arc::clone(&transport.streams);
                thread::spawn(move || leader_reader(peer, reader, &mailbox, &streams));
            }
        }

        Ok(transport)
    }

    fn connect(rank: usize, size: usize, addr: &str) -> Result<Self, GroupError> {
        let mut attempt = 0;
        let mut stream = loop {
            match TcpStream::connect(addr) {
                Ok(stream) => break stream,
                Err(e) if attempt < CONNECT_RETRIES => {
                    log::debug!("rank {} waiting for leader at {}: {}", rank, addr, e);
                    attempt += 1;
                    thread::sleep(CONNECT_DELAY);
                }
                Err(e) => return Err(e.into()),
            }
        };
        stream.set_nodelay(true)?;
        stream.write_all(&(rank as u32).to_le_bytes())?;
        stream.flush()?;

        let reader = stream.try_clone()?;
        let mut streams: Vec<Option<Mutex<TcpStream>>> = (0..size).map(|_| None).collect();
        streams[0] = Some(Mutex::new(stream));

        let transport = Self {
            rank,
            size,
            mailbox: Arc::new(Mailbox::new()),
            streams: Arc::new(streams),
        };

        let mailbox = Arc::clone(&transport.mailbox);
        thread::spawn(move || peer_reader(rank, reader, &mailbox));

        Ok(transport)
    }

    fn shutdown(&self) {
        for stream in self.streams.iter().flatten() {
            let _ = lock(stream).shutdown(Shutdown::Both);
        }
    }
}

// Delivers frames addressed to the leader and relays the others.
fn leader_reader(
    peer: usize,
    stream: TcpStream,
    mailbox: &Mailbox,
    streams: &[Option<Mutex<TcpStream>>],
) {
    let mut reader = BufReader::new(stream);
    let reason = loop {
        match read_frame(&mut reader) {
            Ok(Some(frame)) if frame.source != peer => {
                break format!("rank {} sent a frame as rank {}", peer, frame.source);
            }
            Ok(Some(frame)) if frame.dest == 0 => mailbox.deliver(Envelope {
                source: frame.source,
                tag: frame.tag,
                payload: frame.payload,
            }),
            Ok(Some(frame)) => {
                let Some(Some(out)) = streams.get(frame.dest) else {
                    break format!("rank {} sent to unknown rank {}", peer, frame.dest);
                };
                if let Err(e) = write_frame(out, frame.tag, frame.source, frame.dest, &frame.payload)
                {
                    break format!("relay to rank {} failed: {}", frame.dest, e);
                }
            }
            Ok(None) => break format!("rank {} disconnected", peer),
            Err(e) => break format!("reading from rank {}: {}", peer, e),
        }
    };
    log::debug!("rank 0: {}", reason);
    mailbox.close(&reason);
}

fn peer_reader(rank: usize, stream: TcpStream, mailbox: &Mailbox) {
    let mut reader = BufReader::new(stream);
    let reason = loop {
        match read_frame(&mut reader) {
            Ok(Some(frame)) if frame.dest == rank => mailbox.deliver(Envelope {
                source: frame.source,
                tag: frame.tag,
                payload: frame.payload,
            }),
            Ok(Some(frame)) => break format!("frame for rank {} arrived at {}", frame.dest, rank),
            Ok(None) => break "leader disconnected".to_string(),
            Err(e) => break format!("reading from leader: {}", e),
        }
    };
    log::debug!("rank {}: {}", rank, reason);
    mailbox.close(&reason);
}

impl Transport for TcpTransport {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn send(&self, dest: usize, tag: Tag, payload: Vec<u8>) -> Result<(), GroupError> {
        if dest >= self.size {
            return Err(GroupError::desync(self.rank, format!("no rank {}", dest)));
        }
        if dest == self.rank {
            self.mailbox.deliver(Envelope {
                source: self.rank,
                tag,
                payload,
            });
            return Ok(());
        }

        // Peers route everything through the leader
        let hop = if self.rank == 0 { dest } else { 0 };
        let stream = self.streams[hop]
            .as_ref()
            .ok_or_else(|| GroupError::desync(self.rank, format!("no route to rank {}", dest)))?;
        write_frame(stream, tag, self.rank, dest, &payload).map_err(|e| {
            GroupError::desync(self.rank, format!("sending to rank {}: {}", dest, e))
        })
    }

    fn recv(&self, source: Option<usize>, tags: &[Tag]) -> Result<Envelope, GroupError> {
        self.mailbox
            .take(source, tags)
            .map_err(|reason| GroupError::desync(self.rank, reason))
    }

    fn abort(&self, reason: &str) {
        log::debug!("rank {} aborting: {}", self.rank, reason);
        self.shutdown();
        self.mailbox.close(reason);
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_layout() {
        let (a, b) = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let addr = listener.local_addr().unwrap();
            let a = TcpStream::connect(addr).unwrap();
            let (b, _) = listener.accept().unwrap();
            (a, b)
        };

        write_frame(&Mutex::new(a), Tag::Pairscores, 2, 0, b"abc").unwrap();

        let mut raw = [0u8; FRAME_HEADER_LEN];
        let mut b = b;
        b.read_exact(&mut raw).unwrap();
        assert_eq!(raw[0], Tag::Pairscores.to_u8());
        assert_eq!(&raw[1..5], &2u32.to_le_bytes());
        assert_eq!(&raw[9..13], &3u32.to_le_bytes());

        let mut rest = [0u8; 3];
        b.read_exact(&mut rest).unwrap();
        assert_eq!(&rest, b"abc");
    }

    #[test]
    fn test_read_frame_eof() {
        let mut empty: &[u8] = &[];
        assert!(read_frame(&mut empty).unwrap().is_none());

        let mut bad: &[u8] = &[99, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        assert!(read_frame(&mut bad).is_err());
    }

    #[test]
    fn test_star_relay() {
        let addr = {
            let probe = TcpListener::bind("127.0.0.1:0").unwrap();
            probe.local_addr().unwrap().to_string()
        };

        crossbeam::scope(|s| {
            let leader = s.spawn(|_| TcpTransport::join(0, 3, &addr).unwrap());
            let one = s.spawn(|_| TcpTransport::join(1, 3, &addr).unwrap());
            let two = s.spawn(|_| TcpTransport::join(2, 3, &addr).unwrap());
            let (leader, one, two) = (
                leader.join().unwrap(),
                one.join().unwrap(),
                two.join().unwrap(),
            );

            one.send(2, Tag::Work, vec![1, 2]).unwrap();
            two.send(0, Tag::Barrier, vec![]).unwrap();
            leader.send(1, Tag::Release, vec![9]).unwrap();

            let msg = two.recv(None, &[Tag::Work]).unwrap();
            assert_eq!((msg.source, msg.payload), (1, vec![1, 2]));
            assert_eq!(leader.recv(Some(2), &[Tag::Barrier]).unwrap().source, 2);
            assert_eq!(one.recv(Some(0), &[Tag::Release]).unwrap().payload, [9]);

            // Leaving the group ends the peers' pending receives
            drop(leader);
            assert!(one.recv(Some(0), &[Tag::Release]).is_err());
        })
        .unwrap();
    }
}
