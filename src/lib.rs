pub mod dining;
pub mod sync;
