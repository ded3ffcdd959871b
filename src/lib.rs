// Crate root - export modules
pub mod board;
