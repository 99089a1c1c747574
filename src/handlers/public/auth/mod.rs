// handlers/public/auth/mod.rs - token acquisition
pub mod signin; // POST /signin - verify credentials, issue JWT
pub mod signup; // POST /signup - create account

pub use signin::signin;
pub use signup::signup;
