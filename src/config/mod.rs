pub mod digest;
pub mod publish;
