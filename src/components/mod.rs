pub mod app;
pub mod effects_panel;
pub mod fx_layer;
