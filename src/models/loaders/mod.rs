pub mod line_loader;

pub use line_loader::{decode_text, load_lines, LineFilter};
