pub mod align;
pub mod emit;
pub mod overlap;
pub mod read;
pub mod tally;
pub mod writers;

#[cfg(test)]
pub mod test_utils;
