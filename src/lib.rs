pub mod admin;
pub mod app;
pub mod callbacks;
pub mod cleanup;
pub mod config;
pub mod db;
pub mod delivery;
pub mod gate;
pub mod handlers;
pub mod keyboards;
pub mod model;
pub mod refetch;
pub mod scheduler;
pub mod telegram;
