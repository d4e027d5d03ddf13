pub mod config;
pub mod data;
pub mod db;
pub mod detail;
pub mod form;
pub mod navigation;
pub mod service;
pub mod siblings;
pub mod switch;

pub use detail::{DetailView, DishDetail, RouteParams, Visibility};
pub use service::{DishService, HttpDishService};
