// handlers/mod.rs - two security tiers
//
// Public (no auth): service info, health, OpenAPI document, GraphQL playground
// Protected (JWT + tenant context): /api/v1/* and POST /graphql

pub mod protected;
pub mod public;
