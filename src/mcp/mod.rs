// MCP protocol types, request dispatch and the simulate-transaction tool
pub mod handler;
pub mod protocol;
pub mod simulate;
