pub mod board;
pub mod engine;
pub mod game;
pub mod moves;

#[cfg(not(target_arch = "wasm32"))]
pub mod worker;

#[cfg(target_arch = "wasm32")]
mod wasm_api;
