pub mod account_status;
pub mod change_password;
pub mod change_role;
pub mod email_verification;
pub mod login;
pub mod logout;
pub mod password_reset;
pub mod refresh;
pub mod register;
