use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use comms::specs::diagram::BlockSpec;

/// The blocks of a diagram in execution order.
///
/// Blocks are sorted by their `order`, blocks sharing an order keep the order they were
/// submitted in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockGraph {
    blocks: Vec<BlockSpec>,
}

impl BlockGraph {
    /// Creates a new `BlockGraph`.
    ///
    /// # Arguments
    /// * `blocks` - The blocks as they were submitted.
    pub fn new(mut blocks: Vec<BlockSpec>) -> Self {
        blocks.sort_by_key(|block| block.order);
        Self { blocks }
    }

    pub fn blocks(&self) -> &[BlockSpec] {
        &self.blocks
    }

    /// Returns the amount of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Returns the last block, if any.
    pub fn last(&self) -> Option<&BlockSpec> {
        self.blocks.last()
    }

    /// Hashes the content of the sorted blocks, two graphs with equal blocks hash equally.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        for block in &self.blocks {
            block.block_id.hash(&mut hasher);
            block.order.hash(&mut hasher);
            block.params.len().hash(&mut hasher);

            for (key, value) in &block.params {
                key.hash(&mut hasher);
                value.to_string().hash(&mut hasher);
            }
        }

        hasher.finish()
    }
}
