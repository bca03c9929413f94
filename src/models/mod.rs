pub mod question;
pub mod session;
pub mod test_config;
