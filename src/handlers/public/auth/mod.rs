// handlers/public/auth/mod.rs - Public authentication handlers
//
// POST /register creates an account, POST /login exchanges credentials for a
// bearer token.
pub mod login;
pub mod register;

pub use login::login_post;
pub use register::register_post;
