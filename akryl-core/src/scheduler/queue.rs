//! Stable priority queue.

/// A queue ordered by ascending priority, FIFO among equal priorities.
#[derive(Debug)]
pub struct PriorityQueue<E> {
    entries: Vec<(i32, E)>,
}

impl<E> Default for PriorityQueue<E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<E> PriorityQueue<E> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `element` behind every element whose priority is lower than or
    /// equal to `priority`.
    pub fn push(&mut self, priority: i32, element: E) {
        let index = self.entries.partition_point(|(p, _)| *p <= priority);
        self.entries.insert(index, (priority, element));
    }

    /// Remove and return the first element.
    pub fn pop(&mut self) -> Option<E> {
        if self.entries.is_empty() {
            None
        } else {
            Some(self.entries.remove(0).1)
        }
    }

    /// Remove every element, returning them in queue order.
    pub fn take(&mut self) -> Vec<E> {
        std::mem::take(&mut self.entries)
            .into_iter()
            .map(|(_, element)| element)
            .collect()
    }

    /// Number of queued elements.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(priority, element)` pairs in queue order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &E)> {
        self.entries.iter().map(|(p, e)| (*p, e))
    }
}
