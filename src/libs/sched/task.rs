use crate::libs::wire::prim::*;
use crate::libs::wire::{ByteReader, WireResult};

/// One unit of alignment work.
///
/// In the pairwise phase `a` and `b` are chain indices with `b < a`; in the
/// iterative phase `a` is a live cluster index and `b` is -1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Task {
    pub a: i32,
    pub b: i32,
}

/// Sentinel that ends an executor thread.
pub const TERMINATE: Task = Task { a: -2, b: -2 };

const TASK_LEN: usize = 2 * I32_LEN;

impl Task {
    pub fn new(a: i32, b: i32) -> Self {
        Self { a, b }
    }

    pub fn is_terminate(&self) -> bool {
        *self == TERMINATE
    }
}

impl Wire for Task {
    fn wire_len(&self) -> usize {
        TASK_LEN
    }

    fn put(&self, out: &mut Vec<u8>) -> WireResult<()> {
        put_i32(out, self.a);
        put_i32(out, self.b);
        Ok(())
    }

    fn take(reader: &mut ByteReader<'_>) -> WireResult<Self> {
        Ok(Self {
            a: take_i32(reader, "task")?,
            b: take_i32(reader, "task")?,
        })
    }
}

/// Which work list a round starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generator {
    /// Every unordered pair `(i, j)` with `j < i`
    Pairwise,
    /// One task `(i, -1)` per live cluster
    Iterative,
}

impl Generator {
    pub fn tasks(&self, total_items: usize) -> Vec<Task> {
        let n = total_items as i32;
        match self {
            Generator::Pairwise => (0..n)
                .flat_map(|i| (0..i).map(move |j| Task::new(i, j)))
                .collect(),
            Generator::Iterative => (0..n).map(|i| Task::new(i, -1)).collect(),
        }
    }
}

/// What a requester receives from the task storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    Work(Vec<Task>),
    Terminate,
}

/// Count-prefixed task list, the payload of a `Work` message.
pub fn encode_tasks(tasks: &[Task]) -> WireResult<Vec<u8>> {
    let mut out = Vec::with_capacity(vec_len(tasks));
    put_vec(&mut out, tasks, "tasks")?;
    Ok(out)
}

pub fn decode_tasks(buf: &[u8]) -> WireResult<Vec<Task>> {
    let mut reader = ByteReader::new(buf);
    let tasks = take_vec(&mut reader, "tasks", TASK_LEN)?;
    reader.finish()?;
    Ok(tasks)
}
