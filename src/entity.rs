pub mod conversations;
pub mod feedback;
