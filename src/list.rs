use std::time::{Duration, Instant};

use crate::error::{Error, Result, eyre};

#[derive(Debug)]
struct Node<T> {
    value: Option<T>,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Doubly linked list whose nodes live in an arena and link by index
///
/// Slots of removed nodes are recycled by later inserts.
#[derive(Debug)]
pub struct DoublyLinkedList<T> {
    nodes: Vec<Node<T>>,
    vacant: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<T> DoublyLinkedList<T> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            vacant: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push_front(&mut self, value: T) {
        let index = self.insert_node(value, None, self.head);
        match self.head {
            Some(old) => self.node_mut(old).prev = Some(index),
            None => self.tail = Some(index),
        }
        self.head = Some(index);
    }

    pub fn push_back(&mut self, value: T) {
        let index = self.insert_node(value, self.tail, None);
        match self.tail {
            Some(old) => self.node_mut(old).next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
    }

    pub fn pop_front(&mut self) -> Option<T> {
        self.head.and_then(|index| self.unlink(index))
    }

    pub fn pop_back(&mut self) -> Option<T> {
        self.tail.and_then(|index| self.unlink(index))
    }

    pub fn front(&self) -> Option<&T> {
        self.head
            .and_then(|index| self.nodes.get(index))
            .and_then(|node| node.value.as_ref())
    }

    pub fn back(&self) -> Option<&T> {
        self.tail
            .and_then(|index| self.nodes.get(index))
            .and_then(|node| node.value.as_ref())
    }

    /// Unlink every element matching `predicate`, returning how many were removed
    pub fn remove_where(&mut self, mut predicate: impl FnMut(&T) -> bool) -> usize {
        let mut removed = 0;
        let mut cursor = self.head;
        while let Some(index) = cursor {
            let node = &self.nodes[index];
            cursor = node.next;
            if node.value.as_ref().is_some_and(&mut predicate) {
                self.unlink(index);
                removed += 1;
            }
        }
        removed
    }

    /// Iterate from head to tail
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    fn insert_node(&mut self, value: T, prev: Option<usize>, next: Option<usize>) -> usize {
        let node = Node {
            value: Some(value),
            prev,
            next,
        };
        self.len += 1;
        match self.vacant.pop() {
            Some(index) => {
                self.nodes[index] = node;
                index
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn unlink(&mut self, index: usize) -> Option<T> {
        let node = self.nodes.get_mut(index)?;
        let value = node.value.take()?;
        let (prev, next) = (node.prev.take(), node.next.take());

        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev = prev,
            None => self.tail = prev,
        }

        self.vacant.push(index);
        self.len -= 1;
        Some(value)
    }

    fn node_mut(&mut self, index: usize) -> &mut Node<T> {
        &mut self.nodes[index]
    }
}

impl<T> Default for DoublyLinkedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Iter<'a, T> {
    list: &'a DoublyLinkedList<T>,
    cursor: Option<usize>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.list.nodes.get(self.cursor?)?;
        self.cursor = node.next;
        node.value.as_ref()
    }
}

// ============================================================================
// Timed free list
// ============================================================================

#[derive(Debug)]
struct Freed<T> {
    value: T,
    freed_at: Instant,
}

/// Free list that remembers when each element was returned
///
/// Allocation is LIFO: the most recently freed element comes back first.
#[derive(Debug)]
pub struct TimedFreeList<T> {
    list: DoublyLinkedList<Freed<T>>,
}

impl<T> TimedFreeList<T> {
    pub fn new() -> Self {
        Self {
            list: DoublyLinkedList::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn free(&mut self, value: T, freed_at: Instant) {
        self.list.push_back(Freed { value, freed_at });
    }

    pub fn allocate(&mut self) -> Option<T> {
        self.list.pop_back().map(|freed| freed.value)
    }

    /// Drop every element freed more than `delta` before `now`
    pub fn evict_timed_out(&mut self, now: Instant, delta: Duration) -> Result<usize> {
        if self.list.iter().any(|freed| freed.freed_at > now) {
            return Err(Error::LibraryBug(eyre!(
                "free list holds an element freed after {:?}",
                now
            )));
        }
        Ok(self
            .list
            .remove_where(|freed| now.duration_since(freed.freed_at) > delta))
    }
}

impl<T> Default for TimedFreeList<T> {
    fn default() -> Self {
        Self::new()
    }
}
