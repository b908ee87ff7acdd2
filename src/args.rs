use clap_derive::Parser;
use derive_more::Display;
use dialoguer::{Completion, Input};

use std::{
    error,
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
};

/// The file extensions a HOI4 save usually carries.
const SAVE_EXTENSIONS: [&str; 2] = ["hoi4", "sav"];

/// A [Completion] struct for save file names, that also acts as a list of save files in the current directory.
struct SaveFileNameCompletion {
    save_files: Vec<String>,
}

impl Default for SaveFileNameCompletion {
    fn default() -> Self {
        let mut res = Vec::new();
        let path = Path::new(".");
        if path.is_dir() {
            for entry in fs::read_dir(path).expect("Directory not found") {
                let entry = entry.expect("Unable to read entry").path();
                if entry.is_file() {
                    if let Some(ext) = entry.extension() {
                        if SAVE_EXTENSIONS.iter().any(|e| ext == *e) {
                            res.push(entry.to_string_lossy().into_owned());
                        }
                    }
                }
            }
        }
        SaveFileNameCompletion { save_files: res }
    }
}

impl Completion for SaveFileNameCompletion {
    fn get(&self, input: &str) -> Option<String> {
        self.save_files.iter().find(|x| x.contains(input)).cloned()
    }
}

#[derive(Debug, Display)]
enum InvalidPath {
    #[display("invalid path (does not exist)")]
    InvalidPath,
    #[display("not a file")]
    NotAFile,
}

impl error::Error for InvalidPath {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        None
    }
}

/// A function to validate the file path input.
fn validate_file_path(input: &String) -> Result<(), InvalidPath> {
    let p = Path::new(input);
    if p.exists() {
        if p.is_file() {
            Ok(())
        } else {
            Err(InvalidPath::NotAFile)
        }
    } else {
        Err(InvalidPath::InvalidPath)
    }
}

/// A function to parse the path argument.
fn parse_path_arg(input: &str) -> Result<PathBuf, &'static str> {
    let p = PathBuf::from(input);
    if p.exists() {
        Ok(p)
    } else {
        Err("Invalid path")
    }
}

/// The arguments to the program.
#[derive(Parser)]
pub struct Args {
    #[arg(value_parser = parse_path_arg)]
    /// The path to the save file.
    pub filename: PathBuf,
    #[arg(short, long)]
    /// The tag of the country to inspect. Defaults to the player country.
    pub country: Option<String>,
    #[arg(long, default_value = None)]
    /// A path to write the country snapshot to as JSON.
    pub dump: Option<PathBuf>,
    #[arg(short, long, default_value_t = false)]
    /// A flag that tells the program not to interact with the user.
    pub no_interaction: bool,
}

impl Args {
    /// Create the object based on user input.
    pub fn get_from_user() -> Self {
        println!("Welcome to the HOI4 war room!\nTab autocompletes the save file query and enter confirms the selection.");
        let completion = SaveFileNameCompletion::default();
        let filename = PathBuf::from(
            Input::<String>::new()
                .with_prompt("Enter the save file path")
                .validate_with(validate_file_path)
                .with_initial_text(completion.save_files.first().unwrap_or(&"".to_string()))
                .completion_with(&completion)
                .interact_text()
                .unwrap(),
        );
        Args {
            filename,
            country: None,
            dump: None,
            no_interaction: false,
        }
    }
}
