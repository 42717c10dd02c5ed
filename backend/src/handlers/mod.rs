pub mod auth;
pub mod media;
pub mod pages;
pub mod resource;
