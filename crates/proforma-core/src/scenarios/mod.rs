pub mod sensitivity;
pub mod validation;
