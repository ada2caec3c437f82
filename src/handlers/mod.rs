// handlers/mod.rs - Handlers grouped by access tier
//
// Public (no auth) → Protected (bearer JWT, see middleware::auth)

pub mod protected; // /api/*, requires a bearer token
pub mod public; // /auth/*, open to anyone
