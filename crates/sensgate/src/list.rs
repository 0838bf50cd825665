// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Generic doubly-linked list.
//!
//! [`DpList`] keeps its nodes in an arena of slots linked by index. Element
//! behaviour is fixed at compile time through the element type:
//!
//! | Hook    | Trait   | Used by                                   |
//! |---------|---------|-------------------------------------------|
//! | copy    | `Clone` | `insert_copy_*`                           |
//! | free    | `Drop`  | dropping a removed element or the list    |
//! | compare | `Ord`   | `insert_sorted*`, element lookups         |
//!
//! Bounds are placed per method, so elements that cannot be cloned (a record
//! owning a socket, for instance) can still be stored by move.
//!
//! # Index convention
//!
//! Indices are signed and clamp to the ends of the list: any index `<= 0`
//! addresses the head, any index past the last node addresses the tail (or,
//! for insertion, the position after it).
//!
//! # References
//!
//! A [`NodeRef`] identifies one node for as long as that node stays in the
//! list. Once the node is removed the reference goes stale: every operation
//! treats it as "not in the list", even after its slot is reused.
//!
//! ```
//! use sensgate::list::DpList;
//!
//! let mut list = DpList::new();
//! list.insert_sorted(30);
//! list.insert_sorted(10);
//! list.insert_sorted(20);
//! assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![10, 20, 30]);
//!
//! let middle = list.get_reference_at_index(1).unwrap();
//! assert_eq!(list.remove_at_reference(Some(middle)), Some(20));
//! assert_eq!(list.get_element_at_reference(Some(middle)), None);
//! ```

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;

// ============================================================================
// Node storage
// ============================================================================

/// Stable handle to one node of a [`DpList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    slot: usize,
    generation: u64,
}

struct Node<T> {
    element: T,
    prev: Option<usize>,
    next: Option<usize>,
}

struct Slot<T> {
    /// Bumped every time the slot is vacated.
    generation: u64,
    node: Option<Node<T>>,
}

/// Doubly-linked list of owned elements.
pub struct DpList<T> {
    slots: Vec<Slot<T>>,
    vacant: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl<T> Default for DpList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for DpList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> FromIterator<T> for DpList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        for element in iter {
            list.push_back(element);
        }
        list
    }
}

impl<T> DpList<T> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            vacant: Vec::new(),
            head: None,
            tail: None,
        }
    }

    /// Number of elements, counted by walking the list from head to tail.
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut prev = None;
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            let node = self.node(idx);
            debug_assert_eq!(node.prev, prev, "back link of slot {} is broken", idx);
            count += 1;
            prev = cursor;
            cursor = node.next;
        }
        debug_assert_eq!(prev, self.tail, "tail does not match the last node");
        count
    }

    /// True when the list holds no element.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Iterate over the elements from head to tail.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    /// Release every element to the caller without dropping it, in list order.
    ///
    /// This is the "destroy without freeing" path: the list goes away, the
    /// elements do not.
    pub fn into_elements(mut self) -> Vec<T> {
        let mut elements = Vec::with_capacity(self.slots.len() - self.vacant.len());
        while let Some(head) = self.head {
            self.unlink(head);
            elements.push(self.release(head));
        }
        elements
    }

    // ========================================================================
    // Index-based operations
    // ========================================================================

    /// Insert `element` itself (no copy) at `index`.
    ///
    /// `index <= 0` makes it the new head, `index >= size` appends it after
    /// the tail, anything else places it in front of the node currently at
    /// `index`.
    pub fn insert_at_index(&mut self, element: T, index: isize) -> NodeRef {
        let at = self.insertion_point(index);
        let idx = self.alloc(element);
        self.link_before(idx, at);
        self.reference(idx)
    }

    /// Insert a copy of `element` at `index`; the caller keeps the original.
    pub fn insert_copy_at_index(&mut self, element: &T, index: isize) -> NodeRef
    where
        T: Clone,
    {
        self.insert_at_index(element.clone(), index)
    }

    /// Remove the node at the clamped `index` and hand its element back.
    ///
    /// Dropping the returned value frees it; keeping it leaves the element
    /// alive. Returns `None` on an empty list.
    pub fn remove_at_index(&mut self, index: isize) -> Option<T> {
        let idx = self.slot_at_index(index)?;
        self.unlink(idx);
        Some(self.release(idx))
    }

    /// Element at the clamped `index`.
    pub fn get_element_at_index(&self, index: isize) -> Option<&T> {
        self.slot_at_index(index).map(|idx| &self.node(idx).element)
    }

    /// Mutable element at the clamped `index`.
    pub fn get_element_at_index_mut(&mut self, index: isize) -> Option<&mut T> {
        let idx = self.slot_at_index(index)?;
        Some(&mut self.node_mut(idx).element)
    }

    /// Reference to the node at the clamped `index`.
    pub fn get_reference_at_index(&self, index: isize) -> Option<NodeRef> {
        self.slot_at_index(index).map(|idx| self.reference(idx))
    }

    // ========================================================================
    // Reference-based operations
    // ========================================================================

    pub fn get_first_reference(&self) -> Option<NodeRef> {
        self.head.map(|idx| self.reference(idx))
    }

    pub fn get_last_reference(&self) -> Option<NodeRef> {
        self.tail.map(|idx| self.reference(idx))
    }

    /// Node after `reference`; `None` at the tail or when `reference` is stale.
    pub fn get_next_reference(&self, reference: NodeRef) -> Option<NodeRef> {
        let idx = self.resolve(reference)?;
        self.node(idx).next.map(|next| self.reference(next))
    }

    /// Node before `reference`; `None` at the head or when `reference` is stale.
    pub fn get_previous_reference(&self, reference: NodeRef) -> Option<NodeRef> {
        let idx = self.resolve(reference)?;
        self.node(idx).prev.map(|prev| self.reference(prev))
    }

    /// Element held by `reference`.
    ///
    /// A `None` reference addresses the last element.
    pub fn get_element_at_reference(&self, reference: Option<NodeRef>) -> Option<&T> {
        let idx = match reference {
            Some(r) => self.resolve(r)?,
            None => self.tail?,
        };
        Some(&self.node(idx).element)
    }

    pub fn get_element_at_reference_mut(&mut self, reference: NodeRef) -> Option<&mut T> {
        let idx = self.resolve(reference)?;
        Some(&mut self.node_mut(idx).element)
    }

    /// Position of `reference` counted from the head.
    ///
    /// A `None` reference addresses the last node.
    pub fn get_index_of_reference(&self, reference: Option<NodeRef>) -> Option<usize> {
        let target = match reference {
            Some(r) => self.resolve(r)?,
            None => self.tail?,
        };
        self.slots_in_order().position(|idx| idx == target)
    }

    /// Insert `element` in front of `reference`, or append it when the
    /// reference is `None`.
    ///
    /// A stale reference leaves the list untouched and gives the element back.
    pub fn insert_at_reference(
        &mut self,
        element: T,
        reference: Option<NodeRef>,
    ) -> Result<NodeRef, T> {
        let at = match reference {
            Some(r) => match self.resolve(r) {
                Some(idx) => Some(idx),
                None => return Err(element),
            },
            None => None,
        };
        let idx = self.alloc(element);
        self.link_before(idx, at);
        Ok(self.reference(idx))
    }

    /// Insert a copy of `element` in front of `reference` (append on `None`).
    pub fn insert_copy_at_reference(
        &mut self,
        element: &T,
        reference: Option<NodeRef>,
    ) -> Option<NodeRef>
    where
        T: Clone,
    {
        self.insert_at_reference(element.clone(), reference).ok()
    }

    /// Remove the node behind `reference` (the last node on `None`).
    pub fn remove_at_reference(&mut self, reference: Option<NodeRef>) -> Option<T> {
        let idx = match reference {
            Some(r) => self.resolve(r)?,
            None => self.tail?,
        };
        self.unlink(idx);
        Some(self.release(idx))
    }

    /// First node whose element satisfies `predicate`.
    pub fn find_reference<F>(&self, mut predicate: F) -> Option<NodeRef>
    where
        F: FnMut(&T) -> bool,
    {
        self.slots_in_order()
            .find(|&idx| predicate(&self.node(idx).element))
            .map(|idx| self.reference(idx))
    }

    // ========================================================================
    // Compare-based operations
    // ========================================================================

    /// Index of the first element comparing equal to `key`.
    ///
    /// `key` may be any borrowed form of the element, as long as its
    /// ordering agrees with the element's own.
    pub fn get_index_of_element<Q>(&self, key: &Q) -> Option<usize>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.iter()
            .position(|element| element.borrow().cmp(key) == Ordering::Equal)
    }

    pub fn get_reference_of_element<Q>(&self, key: &Q) -> Option<NodeRef>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_reference(|element| element.borrow().cmp(key) == Ordering::Equal)
    }

    /// Remove the first element comparing equal to `key`.
    pub fn remove_element<Q>(&mut self, key: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let reference = self.get_reference_of_element(key)?;
        self.remove_at_reference(Some(reference))
    }

    /// Insert `element` keeping the list in ascending order.
    ///
    /// The head and tail are checked first; otherwise the element goes in
    /// front of the first node that is not less than it.
    pub fn insert_sorted(&mut self, element: T) -> NodeRef
    where
        T: Ord,
    {
        let at = match (self.head, self.tail) {
            (Some(head), Some(tail)) => {
                if element <= self.node(head).element {
                    Some(head)
                } else if element > self.node(tail).element {
                    None
                } else {
                    self.slots_in_order()
                        .find(|&idx| element <= self.node(idx).element)
                }
            }
            _ => None,
        };
        let idx = self.alloc(element);
        self.link_before(idx, at);
        self.reference(idx)
    }

    /// Sorted insertion of a copy of `element`.
    pub fn insert_copy_sorted(&mut self, element: &T) -> NodeRef
    where
        T: Clone + Ord,
    {
        self.insert_sorted(element.clone())
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn push_back(&mut self, element: T) -> NodeRef {
        let idx = self.alloc(element);
        self.link_before(idx, None);
        self.reference(idx)
    }

    fn node(&self, idx: usize) -> &Node<T> {
        match self.slots[idx].node.as_ref() {
            Some(node) => node,
            None => unreachable!("list link points to vacant slot {}", idx),
        }
    }

    fn node_mut(&mut self, idx: usize) -> &mut Node<T> {
        match self.slots[idx].node.as_mut() {
            Some(node) => node,
            None => unreachable!("list link points to vacant slot {}", idx),
        }
    }

    fn reference(&self, idx: usize) -> NodeRef {
        NodeRef {
            slot: idx,
            generation: self.slots[idx].generation,
        }
    }

    fn resolve(&self, reference: NodeRef) -> Option<usize> {
        let slot = self.slots.get(reference.slot)?;
        (slot.generation == reference.generation && slot.node.is_some()).then_some(reference.slot)
    }

    fn slots_in_order(&self) -> SlotIter<'_, T> {
        SlotIter {
            list: self,
            cursor: self.head,
        }
    }

    /// Node an insertion at `index` goes in front of; `None` means append.
    fn insertion_point(&self, index: isize) -> Option<usize> {
        if index <= 0 {
            return self.head;
        }
        self.slots_in_order().nth(index as usize)
    }

    /// Node at `index`, clamped to the head and tail.
    fn slot_at_index(&self, index: isize) -> Option<usize> {
        let mut cursor = self.head?;
        let mut remaining = index;
        while remaining > 0 {
            match self.node(cursor).next {
                Some(next) => cursor = next,
                None => break,
            }
            remaining -= 1;
        }
        Some(cursor)
    }

    fn alloc(&mut self, element: T) -> usize {
        let node = Node {
            element,
            prev: None,
            next: None,
        };
        match self.vacant.pop() {
            Some(idx) => {
                debug_assert!(self.slots[idx].node.is_none());
                self.slots[idx].node = Some(node);
                idx
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                self.slots.len() - 1
            }
        }
    }

    /// Vacate an unlinked slot and return its element.
    fn release(&mut self, idx: usize) -> T {
        let slot = &mut self.slots[idx];
        let node = match slot.node.take() {
            Some(node) => node,
            None => unreachable!("releasing vacant slot {}", idx),
        };
        slot.generation += 1;
        self.vacant.push(idx);
        node.element
    }

    /// Link the detached node `idx` in front of `at`, or after the tail.
    fn link_before(&mut self, idx: usize, at: Option<usize>) {
        let prev = match at {
            Some(at) => self.node(at).prev,
            None => self.tail,
        };
        {
            let node = self.node_mut(idx);
            node.prev = prev;
            node.next = at;
        }
        match prev {
            Some(p) => self.node_mut(p).next = Some(idx),
            None => self.head = Some(idx),
        }
        match at {
            Some(a) => self.node_mut(a).prev = Some(idx),
            None => self.tail = Some(idx),
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = {
            let node = self.node_mut(idx);
            (node.prev.take(), node.next.take())
        };
        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => {
                debug_assert_eq!(self.head, Some(idx));
                self.head = next;
            }
        }
        match next {
            Some(n) => self.node_mut(n).prev = prev,
            None => {
                debug_assert_eq!(self.tail, Some(idx));
                self.tail = prev;
            }
        }
    }
}

// ============================================================================
// Iteration
// ============================================================================

/// Head-to-tail iterator over a [`DpList`].
pub struct Iter<'a, T> {
    list: &'a DpList<T>,
    cursor: Option<usize>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.cursor?;
        let node = self.list.node(idx);
        self.cursor = node.next;
        Some(&node.element)
    }
}

impl<'a, T> IntoIterator for &'a DpList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

struct SlotIter<'a, T> {
    list: &'a DpList<T>,
    cursor: Option<usize>,
}

impl<T> Iterator for SlotIter<'_, T> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let idx = self.cursor?;
        self.cursor = self.list.node(idx).next;
        Some(idx)
    }
}

// ============================================================================
// Tests
// ============================================================================
