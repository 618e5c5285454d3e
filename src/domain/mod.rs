pub mod lifecycle;
pub mod poll;
pub mod ports;
pub mod types;

#[cfg(test)]
pub mod testing;
