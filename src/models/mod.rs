pub mod department;
pub mod email;
pub mod employee;
pub mod role;
pub mod user;
