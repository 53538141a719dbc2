//! `demo`: a small tool integration exercising every descriptor feature.
//!
//! Runs `mycmd` inside the image. The parameter file name is derived from the
//! DWI input and is only passed when `returnParameterFile` is set.

use crate::core::descriptor::ParameterDescriptor;
use crate::core::schema::Schema;
use crate::error::CompileResult;

use super::TaskType;

pub const NAME: &str = "demo";
pub const COMMAND: &str = "mycmd";

pub fn task() -> CompileResult<TaskType> {
    Ok(TaskType {
        name: NAME.to_string(),
        summary: "Demo integration running mycmd with derived parameter files".to_string(),
        container_command: Some(COMMAND.to_string()),
        schema: schema()?,
    })
}

fn schema() -> CompileResult<Schema> {
    Schema::new(vec![
        ParameterDescriptor::scalar("myarg", "--myarg %s")?.describe("An argument"),
        ParameterDescriptor::path("dwiFile", "--dwiFile %s")?
            .container_path()
            .must_exist()
            .describe("Input diffusion weighted (DWI) file"),
        ParameterDescriptor::boolean("returnParameterFile")
            .describe("Write a return parameter file"),
        ParameterDescriptor::path("returnParameterFileName", "--returnparameterfile %s")?
            .container_path()
            .derived_from("dwiFile", "%s_params.txt")?
            .requires(&["returnParameterFile"])
            .describe("Filename to write simple return parameters to"),
        ParameterDescriptor::path("inputSubject", "%s")?
            .at(1)
            .container_path()
            .describe("Whole-brain tractography as vtkPolyData (.vtk or .vtp)"),
    ])
}
