pub mod chat;
pub mod conversations;
pub mod misc;
pub mod profiles;
