pub use super::authors::Entity as Authors;
pub use super::recipes::Entity as Recipes;
