//! Pure transforms from raw payloads to ordered, classified view-models.
//! No I/O happens here, so everything is deterministic given its input.

pub mod agents;
pub mod queues;

pub use agents::{present_agents, AgentView};
pub use queues::{present_queues, QueueView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusColor {
    Green,
    Orange,
    Red,
    Blue,
    Gray,
}

impl StatusColor {
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Green => (0x48, 0xbb, 0x78),
            Self::Orange => (0xed, 0x89, 0x36),
            Self::Red => (0xf5, 0x65, 0x65),
            Self::Blue => (0x42, 0x99, 0xe1),
            Self::Gray => (0x99, 0x99, 0x99),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Orange => "orange",
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Gray => "gray",
        }
    }
}
