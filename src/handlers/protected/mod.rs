// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every route here sits behind `jwt_auth_middleware`, which places an
// `AuthUser` in the request extensions. The identity is used for logging and
// as the default owner of new records; it is not compared against the owner
// of existing snippets or folders.
pub mod auth;
pub mod folders;
pub mod snippets;
pub mod tags;
