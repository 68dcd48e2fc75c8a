pub mod board;
pub mod news;
pub mod notice;
pub mod quote_inquiry;
