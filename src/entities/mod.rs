pub mod prelude;

pub mod authors;
pub mod recipes;
