pub mod attendance;
pub mod auth_token;
pub mod department;
pub mod user;
pub mod user_role;
pub mod user_type;
