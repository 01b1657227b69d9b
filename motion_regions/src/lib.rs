// THEORY:
// This file is the main entry point for the `motion_regions` library crate.
// It exposes the `MotionPipeline` (the rolling previous-frame slot plus the
// per-frame analysis) and the `detect_regions` / `render_regions` building
// blocks behind it. The pixel-level machinery lives in `core_modules`: explicit
// grid types, dense optical flow, the motion mask, contour extraction, rotated
// rectangle fitting, region measurement and the overlay renderer.
//
// The crate is deliberately free of any camera or windowing code. Frames come
// in as `image` buffers and leave as `image` buffers, so the whole detector can
// be exercised with synthetic frames; the OpenCV capture loop lives in the
// `live_preview` binary.

pub mod core_modules;
pub mod error;
pub mod pipeline;

pub use error::MotionError;
pub use core_modules::region::Region;
pub use pipeline::{
    DetectorConfig, FrameAnalysis, MotionPipeline, MotionVector, RenderStyle, RotatedRect, detect_regions,
    render_regions,
};
