pub mod interaction;
pub mod listing;
