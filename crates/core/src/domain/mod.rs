pub mod medicine;
pub mod recommendation;
