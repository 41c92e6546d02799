use serde::{Deserialize, Serialize};

pub type BlockId = u16;
pub type BlockState = u16;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub state: BlockState,
}

impl Block {
    pub const AIR: Block = Block { id: 0, state: 0 };

    #[inline]
    pub const fn new(id: BlockId) -> Self {
        Self { id, state: 0 }
    }

    #[inline]
    pub const fn with_state(id: BlockId, state: BlockState) -> Self {
        Self { id, state }
    }

    #[inline]
    pub fn is_air(self) -> bool {
        self.id == Block::AIR.id
    }
}
