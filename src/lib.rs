pub mod caller;
pub mod cli;
pub mod commands;
pub mod phasing;
pub mod utils;
