pub mod api;
pub mod config;
pub mod controller;
pub mod history;
pub mod location;
pub mod poem;
pub mod view;
pub mod viewer;
