pub mod call;
pub mod phase;
