pub mod bugs;
pub mod info;
pub mod search;
mod registry;

pub use bugs::{AddCommentTool, BugCommentsTool, BugInfoTool};
pub use info::{BugUrlTool, CurrentHeadersTool, ServerInfoTool, ServerUrlTool};
pub use registry::{
    json_schema_boolean, json_schema_integer, json_schema_object, json_schema_string,
    parse_arguments, Tool, ToolContext, ToolRegistry,
};
pub use search::{QuicksearchSyntaxTool, QuicksearchTool};
