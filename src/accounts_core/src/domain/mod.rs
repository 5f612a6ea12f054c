pub mod address;
pub mod email;
pub mod errors;
pub mod password;
pub mod phone;
pub mod role;
pub mod tokens;
pub mod user;
pub mod user_id;
pub mod user_name;
pub mod verification_token;
