pub mod contour;
pub mod grid;
pub mod motion_mask;
pub mod optical_flow;
pub mod region;
pub mod render;
pub mod rotated_rect;
pub mod utils;
