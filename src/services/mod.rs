// Services module - Business logic

pub mod catalog;
pub mod moderation;
pub mod voting;
