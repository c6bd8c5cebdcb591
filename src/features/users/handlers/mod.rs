pub mod provisioning_handler;
pub mod user_handler;
