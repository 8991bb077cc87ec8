pub mod analytics;
pub mod category;
pub mod engagement;
pub mod follow;
pub mod notification;
pub mod post;
pub mod recommendation;
pub mod response;
pub mod search;
pub mod user;
