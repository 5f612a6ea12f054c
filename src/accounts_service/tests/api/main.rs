mod email_verification;
mod helpers;
mod login;
mod password_reset;
mod postgres;
mod refresh;
