// handlers/protected/mod.rs - endpoints behind the JWT gate
//
// Every handler here can rely on an `AuthUser` extension being present;
// the gate rejects the request before routing otherwise.
pub mod movies;
pub mod reviews;
