pub mod file;

pub use file::{load_board, load_board_or, save_board};
