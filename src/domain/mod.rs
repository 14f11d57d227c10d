pub mod cycle;
pub mod matcher;
pub mod playlist;
pub mod streak;
pub mod survey;
