pub mod options;
pub mod ranked;
pub mod scatter;

pub use options::{ChartOptions, PlotKind};
pub use ranked::render_ranked;
pub use scatter::render_correlation;
