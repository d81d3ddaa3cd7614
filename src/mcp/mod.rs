//! MCP server
//!
//! Exposes the coach tools over the Model Context Protocol.

mod server;

pub use server::CoachPlanService;
