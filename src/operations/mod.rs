pub mod boolean;
pub mod creation;
