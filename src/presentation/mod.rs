// Presentation layer - Panel rendering and the settings form
pub mod app_state;
pub mod handlers;
pub mod plane;
pub mod renderer;
