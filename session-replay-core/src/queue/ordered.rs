//! FIFO storage for recorded items
//!
//! Only the tail accepts items and only the head can be inspected or
//! removed. Ordering is therefore exactly producer insertion order.

use crate::error::{Result, SessionReplayError};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// Thread-safe FIFO queue with head-only access
#[derive(Debug)]
pub struct OrderedQueue<T> {
    items: Mutex<VecDeque<T>>,
}

impl<T: Clone> OrderedQueue<T> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, VecDeque<T>>> {
        self.items
            .lock()
            .map_err(|e| SessionReplayError::QueueUnavailable(e.to_string()))
    }

    /// Append an item to the tail
    pub fn offer(&self, item: T) -> Result<()> {
        self.lock()?.push_back(item);
        Ok(())
    }

    /// Clone of the head item, if any
    pub fn peek_head(&self) -> Result<Option<T>> {
        Ok(self.lock()?.front().cloned())
    }

    /// Remove and return the head item, if any
    pub fn poll_head(&self) -> Result<Option<T>> {
        Ok(self.lock()?.pop_front())
    }

    /// Remove every item, returning how many were discarded
    pub fn clear(&self) -> Result<usize> {
        let mut items = self.lock()?;
        let count = items.len();
        items.clear();
        Ok(count)
    }

    pub fn len(&self) -> usize {
        self.lock().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone> Default for OrderedQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_fifo_order() {
        let queue = OrderedQueue::new();
        queue.offer(1).unwrap();
        queue.offer(2).unwrap();
        queue.offer(3).unwrap();

        assert_eq!(queue.peek_head().unwrap(), Some(1));
        assert_eq!(queue.poll_head().unwrap(), Some(1));
        assert_eq!(queue.poll_head().unwrap(), Some(2));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.poll_head().unwrap(), Some(3));
        assert_eq!(queue.poll_head().unwrap(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_peek_does_not_remove() {
        let queue = OrderedQueue::new();
        queue.offer("a").unwrap();
        assert_eq!(queue.peek_head().unwrap(), Some("a"));
        assert_eq!(queue.peek_head().unwrap(), Some("a"));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_clear_reports_count() {
        let queue = OrderedQueue::new();
        for i in 0..5 {
            queue.offer(i).unwrap();
        }
        assert_eq!(queue.clear().unwrap(), 5);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_concurrent_offers_keep_per_producer_order() {
        let queue = Arc::new(OrderedQueue::new());
        let producers: Vec<_> = (0..4u32)
            .map(|producer| {
                let queue = queue.clone();
                thread::spawn(move || {
                    for seq in 0..250u32 {
                        queue.offer((producer, seq)).unwrap();
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        assert_eq!(queue.len(), 1000);
        let mut last_seen = [None::<u32>; 4];
        while let Some((producer, seq)) = queue.poll_head().unwrap() {
            let slot = &mut last_seen[producer as usize];
            if let Some(previous) = *slot {
                assert!(seq > previous);
            }
            *slot = Some(seq);
        }
    }
}
