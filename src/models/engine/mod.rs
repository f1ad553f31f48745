pub mod hit_window;
pub mod note;
pub mod weights;

pub use hit_window::HitWindow;
pub use note::{HitObject, LoadedChart, load_map, parse_map, total_judgements};
