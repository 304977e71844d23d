pub mod feedback;
pub mod score;
