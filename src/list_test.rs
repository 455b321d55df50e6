use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;

use crate::list::{DoublyLinkedList, TimedFreeList};

fn contents(list: &DoublyLinkedList<i32>) -> Vec<i32> {
    list.iter().copied().collect()
}

#[test]
fn push_and_pop_both_ends() {
    let mut list = DoublyLinkedList::new();
    assert!(list.is_empty());
    assert_eq!(list.pop_front(), None);
    assert_eq!(list.pop_back(), None);

    list.push_back(2);
    list.push_front(1);
    list.push_back(3);
    assert_eq!(contents(&list), vec![1, 2, 3]);
    assert_eq!(list.front(), Some(&1));
    assert_eq!(list.back(), Some(&3));

    assert_eq!(list.pop_back(), Some(3));
    assert_eq!(list.pop_front(), Some(1));
    assert_eq!(list.pop_front(), Some(2));
    assert!(list.is_empty());
    assert_eq!(list.front(), None);
}

#[test]
fn slots_are_reused() {
    let mut list = DoublyLinkedList::new();
    for i in 0..4 {
        list.push_back(i);
    }
    list.pop_front();
    list.pop_front();
    list.push_front(10);
    list.push_back(11);
    assert_eq!(contents(&list), vec![10, 2, 3, 11]);
    assert_eq!(list.len(), 4);
}

#[test]
fn remove_where_unlinks_anywhere() {
    let mut list = DoublyLinkedList::new();
    for i in 0..8 {
        list.push_back(i);
    }
    assert_eq!(list.remove_where(|v| v % 3 == 0), 3);
    assert_eq!(contents(&list), vec![1, 2, 4, 5, 7]);
    assert_eq!(list.remove_where(|_| true), 5);
    assert!(list.is_empty());
    list.push_back(42);
    assert_eq!(contents(&list), vec![42]);
}

#[test]
fn timed_free_list_is_lifo() {
    let now = Instant::now();
    let mut free_list = TimedFreeList::new();
    free_list.free("a", now);
    free_list.free("b", now);
    free_list.free("c", now);
    assert_eq!(free_list.allocate(), Some("c"));
    assert_eq!(free_list.allocate(), Some("b"));
    free_list.free("d", now);
    assert_eq!(free_list.allocate(), Some("d"));
    assert_eq!(free_list.allocate(), Some("a"));
    assert_eq!(free_list.allocate(), None);
}

#[test]
fn timed_free_list_evicts_old_entries() {
    let base = Instant::now();
    let delta = Duration::from_secs(10);
    let mut free_list = TimedFreeList::new();
    free_list.free(1, base);
    free_list.free(2, base + Duration::from_secs(5));
    free_list.free(3, base + Duration::from_secs(20));

    let evicted = free_list
        .evict_timed_out(base + Duration::from_secs(21), delta)
        .unwrap();
    assert_eq!(evicted, 2);
    assert_eq!(free_list.allocate(), Some(3));
    assert!(free_list.is_empty());
}

#[test]
fn timed_free_list_rejects_future_entries() {
    let base = Instant::now();
    let mut free_list = TimedFreeList::new();
    free_list.free(1, base + Duration::from_secs(1));
    assert!(
        free_list
            .evict_timed_out(base, Duration::from_secs(1))
            .is_err()
    );
}
