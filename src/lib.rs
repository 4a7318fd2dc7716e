pub mod animation;
pub mod converter;
pub mod diagnostics;
pub mod geometry;
pub mod material;
pub mod math;
pub mod pdx;
pub mod scene;
pub mod skeleton;
