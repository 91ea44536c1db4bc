pub mod add;
pub mod config;
pub mod delete;
pub mod list;
pub mod update;
pub mod view;
