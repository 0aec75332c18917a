pub mod oauth;
pub mod profile;
pub mod session;
