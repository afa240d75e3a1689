pub mod fake_engine;
pub mod generator;
