/*
 * Responsibility
 * - auth: token verification, trust and permission checks, providers
 * - keys: issuer key sets (remote with caching, or static)
 */
pub mod auth;
pub mod keys;
