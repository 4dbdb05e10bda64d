//! Output relay queue: the one bridge between background process readers
//! and the single-threaded UI.
//!
//! Background readers push text chunks as they arrive; the UI drains the
//! queue on a short fixed interval and appends everything, in push order, to
//! the terminal log. The UI never blocks waiting for output and the readers
//! never touch UI state.

use std::io::{BufRead, BufReader, Read};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

/// Creates a connected sender/queue pair.
pub fn relay_channel() -> (RelaySender, RelayQueue) {
    let (tx, rx) = channel();
    (RelaySender { tx }, RelayQueue { rx })
}

/// Producer half, cloned into background reader threads.
#[derive(Clone)]
pub struct RelaySender {
    tx: Sender<String>,
}

impl RelaySender {
    /// Pushes one chunk. A send failure means the UI side is gone, in which
    /// case there is nobody left to show the chunk to.
    pub fn push(&self, chunk: impl Into<String>) {
        let _ = self.tx.send(chunk.into());
    }
}

/// Consumer half, owned by the UI.
pub struct RelayQueue {
    rx: Receiver<String>,
}

impl RelayQueue {
    /// Returns every chunk currently queued, in push order, without blocking.
    pub fn drain_all(&self) -> Vec<String> {
        let mut chunks = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(chunk) => chunks.push(chunk),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        chunks
    }
}

/// Spawns a thread that reads `stream` line-by-line until end-of-stream,
/// pushing each line to the relay as it arrives. Returns the reader handle
/// so a session monitor can detect end-of-stream.
pub fn spawn_line_reader<R>(stream: R, sender: RelaySender) -> JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let reader = BufReader::new(stream);
        for line in reader.lines() {
            match line {
                Ok(line) => sender.push(line),
                Err(_) => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_preserves_push_order() {
        let (tx, queue) = relay_channel();
        for i in 0..50 {
            tx.push(format!("chunk {i}"));
        }
        let drained = queue.drain_all();
        assert_eq!(drained.len(), 50);
        for (i, chunk) in drained.iter().enumerate() {
            assert_eq!(chunk, &format!("chunk {i}"));
        }
    }

    #[test]
    fn consecutive_drains_never_duplicate_or_lose() {
        let (tx, queue) = relay_channel();
        tx.push("a");
        tx.push("b");
        assert_eq!(queue.drain_all(), ["a", "b"]);
        assert!(queue.drain_all().is_empty());
        tx.push("c");
        assert_eq!(queue.drain_all(), ["c"]);
    }

    #[test]
    fn drain_is_non_blocking_when_empty() {
        let (_tx, queue) = relay_channel();
        assert!(queue.drain_all().is_empty());
    }

    #[test]
    fn drain_survives_sender_disconnect() {
        let (tx, queue) = relay_channel();
        tx.push("last words");
        drop(tx);
        assert_eq!(queue.drain_all(), ["last words"]);
        assert!(queue.drain_all().is_empty());
    }

    #[test]
    fn line_reader_pushes_each_line_in_order() {
        let (tx, queue) = relay_channel();
        let data = "first\nsecond\nthird\n";
        let handle = spawn_line_reader(std::io::Cursor::new(data.to_string()), tx);
        handle.join().unwrap();
        assert_eq!(queue.drain_all(), ["first", "second", "third"]);
    }

    #[test]
    fn cross_thread_pushes_arrive_in_send_order() {
        let (tx, queue) = relay_channel();
        let producer = thread::spawn(move || {
            for i in 0..200 {
                tx.push(format!("{i}"));
            }
        });
        producer.join().unwrap();
        let drained = queue.drain_all();
        assert_eq!(drained.len(), 200);
        assert_eq!(drained[0], "0");
        assert_eq!(drained[199], "199");
    }
}
