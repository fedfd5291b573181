/// Router Module Index
///
/// Routes are grouped by who may call them. The gate is applied per group in
/// `create_router`, so a handler's group decides whether it is reachable
/// without a token.

/// Routes anyone may call: health, registration and the two logins.
pub mod public;

/// Routes behind the auth gate. Ownership checks happen in the handlers.
pub mod authenticated;

/// Routes behind the auth gate that additionally require an admin subject.
pub mod admin;
