pub mod color;
pub mod engine;
pub mod path;
pub mod scene;

pub use color::{Color, ColorScale};
pub use engine::{
    BarRect, LineVisibility, PointsVisibility, SelectedState, YAxisRender, draw_area_series,
    draw_bars, draw_cursor_line, draw_line_series, draw_numeric_axis, draw_point_markers,
    draw_time_axis, draw_y_axes, format_time_tick,
};
pub use path::{area_path, line_path, segment_count};
pub use scene::{SceneNode, format_number};
