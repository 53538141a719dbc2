//! Container runtime parameters shared by every task type.

use crate::core::compiler::{DEBUG_PARAM, MOUNTS_PARAM};
use crate::core::descriptor::ParameterDescriptor;
use crate::core::schema::Schema;
use crate::error::CompileResult;

pub const CONTAINER_PARAM: &str = "container";
pub const CONTAINER_COMMAND_PARAM: &str = "container_command";
pub const LOG_FILE_PARAM: &str = "log_file";

/// Base schema: `[-B host:container ...] <image> [inner-command] ... [> log 2>&1]`.
pub fn runtime_schema() -> CompileResult<Schema> {
    Schema::new(vec![
        ParameterDescriptor::boolean(DEBUG_PARAM).describe("Run the container runtime in debug mode"),
        ParameterDescriptor::path_list(MOUNTS_PARAM, "-B %s...")?
            .at(1)
            .describe("Directories to bind into the container (host:container)"),
        ParameterDescriptor::path(CONTAINER_PARAM, "%s")?
            .at(2)
            .mandatory()
            .must_exist()
            .describe("Container image"),
        ParameterDescriptor::scalar(CONTAINER_COMMAND_PARAM, "%s")?
            .at(3)
            .describe("Command to run inside the container"),
        ParameterDescriptor::path(LOG_FILE_PARAM, "> %s 2>&1")?
            .at(-1)
            .describe("Host file receiving combined stdout and stderr"),
    ])
}
