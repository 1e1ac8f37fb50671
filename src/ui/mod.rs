pub mod embeds;
pub mod tables;
