// handlers/protected/mod.rs - Handlers behind the bearer-token middleware
//
// Every handler here can rely on an `Extension<AuthUser>` being present.

pub mod worklogs;
