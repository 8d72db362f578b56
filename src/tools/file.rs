use std::fs;
use std::path::Path;

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::{Tool, ToolError, args_schema, parse_args};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FileArgs {
    /// Path of the file.
    pub file_path: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct WriteFileArgs {
    /// Path of the file; missing parent directories are created.
    pub file_path: String,
    /// Full new contents of the file.
    pub content: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DirectoryArgs {
    /// Path of the directory.
    pub directory_path: String,
}

pub struct WriteFile;

impl Tool for WriteFile {
    fn name(&self) -> &'static str {
        "write_file"
    }

    fn description(&self) -> &'static str {
        "Write to a file."
    }

    fn parameters(&self) -> Value {
        args_schema::<WriteFileArgs>()
    }

    fn call(&self, arguments: &str) -> Result<String, ToolError> {
        let args: WriteFileArgs = parse_args(arguments)?;
        if let Some(parent) = Path::new(&args.file_path).parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&args.file_path, args.content)?;
        Ok("File written successfully.".to_string())
    }
}

pub struct ReadFile;

impl Tool for ReadFile {
    fn name(&self) -> &'static str {
        "read_file"
    }

    fn description(&self) -> &'static str {
        "Read a file."
    }

    fn parameters(&self) -> Value {
        args_schema::<FileArgs>()
    }

    fn call(&self, arguments: &str) -> Result<String, ToolError> {
        let args: FileArgs = parse_args(arguments)?;
        Ok(fs::read_to_string(args.file_path)?)
    }
}

pub struct DeleteFile;

impl Tool for DeleteFile {
    fn name(&self) -> &'static str {
        "delete_file"
    }

    fn description(&self) -> &'static str {
        "Delete a file."
    }

    fn parameters(&self) -> Value {
        args_schema::<FileArgs>()
    }

    fn call(&self, arguments: &str) -> Result<String, ToolError> {
        let args: FileArgs = parse_args(arguments)?;
        fs::remove_file(args.file_path)?;
        Ok("File deleted successfully.".to_string())
    }
}

pub struct CreateDirectory;

impl Tool for CreateDirectory {
    fn name(&self) -> &'static str {
        "create_directory"
    }

    fn description(&self) -> &'static str {
        "Create a directory."
    }

    fn parameters(&self) -> Value {
        args_schema::<DirectoryArgs>()
    }

    fn call(&self, arguments: &str) -> Result<String, ToolError> {
        let args: DirectoryArgs = parse_args(arguments)?;
        if Path::new(&args.directory_path).exists() {
            return Ok("Directory already exists.".to_string());
        }
        fs::create_dir_all(&args.directory_path)?;
        Ok("Directory created successfully.".to_string())
    }
}

/// Removes an empty directory only.
pub struct DeleteDirectory;

impl Tool for DeleteDirectory {
    fn name(&self) -> &'static str {
        "delete_directory"
    }

    fn description(&self) -> &'static str {
        "Delete a directory."
    }

    fn parameters(&self) -> Value {
        args_schema::<DirectoryArgs>()
    }

    fn call(&self, arguments: &str) -> Result<String, ToolError> {
        let args: DirectoryArgs = parse_args(arguments)?;
        if !Path::new(&args.directory_path).exists() {
            return Ok("Directory does not exist.".to_string());
        }
        fs::remove_dir(&args.directory_path)?;
        Ok("Directory deleted successfully.".to_string())
    }
}
