pub mod dto;
pub mod inference;
pub mod lifecycle;
pub mod ports;
pub mod services;

#[cfg(test)]
pub mod testing;
