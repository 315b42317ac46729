mod store;

pub use store::{SlotStore, MIN_CAPACITY};
