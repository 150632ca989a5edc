pub mod handlers;
pub mod models;
pub mod reader;
pub mod validation;
pub mod writer;

#[cfg(test)]
pub mod testing;
