/*
 * Responsibility
 * - auth: route guards and the authenticated identity extractor
 * - http: cross-cutting transport layers (trace, request id, limits)
 */
pub mod auth;
pub mod http;
