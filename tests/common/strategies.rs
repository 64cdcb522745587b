#![allow(dead_code)]

use proptest::prelude::*;

/// Strategy for generating valid titles
pub fn title_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9 ]{0,40}"
}

/// For each element of a batch, whether it refers to a stored entity
pub fn batch_membership_strategy() -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(any::<bool>(), 1..=40)
}

/// A sequence of re-parent attempts over `list_count` lists; `None` targets the root
pub fn list_moves_strategy(list_count: usize) -> impl Strategy<Value = Vec<(usize, Option<usize>)>> {
    prop::collection::vec(
        (0..list_count, prop::option::weighted(0.8, 0..list_count)),
        1..30,
    )
}

/// Dependency edges `(from, to)` over `item_count` items, self-loops included
pub fn dependency_edges_strategy(item_count: usize) -> impl Strategy<Value = Vec<(usize, usize)>> {
    prop::collection::vec((0..item_count, 0..item_count), 1..25)
}
