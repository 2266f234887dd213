pub mod app;
pub mod help_overlay;
pub mod map_view;
pub mod status_panel;
pub mod zoom_controls;
