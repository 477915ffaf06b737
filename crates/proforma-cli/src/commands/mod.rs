pub mod equity;
pub mod pro_forma;
pub mod sensitivity;
