// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test code readability over pedantic
#![allow(clippy::cast_possible_wrap)] // Test conversions
#![allow(clippy::cast_sign_loss)] // Test conversions

//! Randomized checks of `DpList` against a `Vec` model.

use sensgate::list::{DpList, NodeRef};

fn clamp(index: isize, len: usize) -> usize {
    if index <= 0 {
        0
    } else {
        (index as usize).min(len.saturating_sub(1))
    }
}

fn assert_matches(list: &DpList<u32>, model: &[u32]) {
    assert_eq!(list.size(), model.len());
    assert_eq!(list.iter().copied().collect::<Vec<_>>(), model);

    // Walking backwards from the tail visits the same elements reversed.
    let mut backwards = Vec::new();
    let mut cursor = list.get_last_reference();
    while let Some(r) = cursor {
        backwards.push(*list.get_element_at_reference(Some(r)).unwrap());
        cursor = list.get_previous_reference(r);
    }
    backwards.reverse();
    assert_eq!(backwards, model);
}

#[test]
fn random_index_operations_match_vec() {
    let mut rng = fastrand::Rng::with_seed(0x5e75_6a7e);

    for _round in 0..50 {
        let mut list = DpList::new();
        let mut model: Vec<u32> = Vec::new();

        for _ in 0..200 {
            let index = rng.isize(-3..(model.len() as isize + 4));
            match rng.u8(..4) {
                0 | 1 => {
                    let value = rng.u32(..1000);
                    list.insert_at_index(value, index);
                    let pos = if index <= 0 {
                        0
                    } else {
                        (index as usize).min(model.len())
                    };
                    model.insert(pos, value);
                }
                2 => {
                    let removed = list.remove_at_index(index);
                    if model.is_empty() {
                        assert_eq!(removed, None);
                    } else {
                        let pos = clamp(index, model.len());
                        assert_eq!(removed, Some(model.remove(pos)));
                    }
                }
                _ => {
                    let got = list.get_element_at_index(index).copied();
                    let expected = if model.is_empty() {
                        None
                    } else {
                        Some(model[clamp(index, model.len())])
                    };
                    assert_eq!(got, expected);
                }
            }
        }
        assert_matches(&list, &model);
    }
}

#[test]
fn sorted_insertion_always_sorted() {
    let mut rng = fastrand::Rng::with_seed(42);

    for _round in 0..30 {
        let mut list = DpList::new();
        let mut model = Vec::new();
        for _ in 0..100 {
            let value = rng.u32(..50);
            list.insert_sorted(value);
            model.push(value);
        }
        model.sort_unstable();
        assert_matches(&list, &model);
    }
}

#[test]
fn references_survive_unrelated_removals() {
    let mut rng = fastrand::Rng::with_seed(7);
    let mut list = DpList::new();
    let refs: Vec<NodeRef> = (0..64u32).map(|v| list.insert_at_index(v, 64)).collect();

    let mut alive: Vec<(NodeRef, u32)> = refs.iter().copied().zip(0..64u32).collect();
    while !alive.is_empty() {
        let victim = rng.usize(..alive.len());
        let (r, v) = alive.swap_remove(victim);
        assert_eq!(list.remove_at_reference(Some(r)), Some(v));
        assert_eq!(list.get_element_at_reference(Some(r)), None);

        for (other, value) in &alive {
            assert_eq!(list.get_element_at_reference(Some(*other)), Some(value));
        }
    }
    assert!(list.is_empty());
}

#[test]
fn lookup_by_element_finds_first_occurrence() {
    let list: DpList<u32> = vec![5, 3, 5, 9].into_iter().collect();
    assert_eq!(list.get_index_of_element(&5), Some(0));
    assert_eq!(list.get_index_of_element(&9), Some(3));
    assert_eq!(list.get_index_of_element(&1), None);

    let r = list.get_reference_of_element(&3).unwrap();
    assert_eq!(list.get_index_of_reference(Some(r)), Some(1));
}
