// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition lives here. Every input is untrusted.

pub mod auth;
