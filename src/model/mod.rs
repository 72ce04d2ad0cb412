pub mod attendance;
pub mod department;
pub mod user;
pub mod user_role;
pub mod user_type;
