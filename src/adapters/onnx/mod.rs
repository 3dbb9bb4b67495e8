pub mod classifier;
pub mod loader;
pub mod preprocess;
