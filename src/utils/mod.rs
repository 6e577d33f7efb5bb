pub mod limits;
pub mod time;
