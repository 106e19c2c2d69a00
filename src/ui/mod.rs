pub mod gamepad;
pub mod input;
pub mod playback;
pub mod renderer;
