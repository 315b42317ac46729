pub mod alloc;
pub mod error;
pub mod matrix;
pub mod modular;
pub mod multiply;
pub mod sort;
pub mod store;
pub mod subset;
pub mod transpose;

pub use alloc::Allocator;
pub use error::{OctaveError, OctaveResult};
pub use matrix::Matrix;
pub use modular::{Residue, MODULUS};
pub use multiply::{multiply, multiply_naive, multiply_strassen, Strategy};
pub use sort::merge_sort_by_key;
pub use store::MatrixStore;
pub use subset::resize;
pub use transpose::transpose;
