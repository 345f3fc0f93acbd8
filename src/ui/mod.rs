pub mod board;
pub mod icons;

pub use board::{render_activity, render_board, render_dashboard, render_stats};
