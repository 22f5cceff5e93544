pub mod roles;
pub mod wire;

pub use roles::UserKind;
pub use wire::{ChatFrame, DeliveredMessage};
