use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "No API key found. Please put your API key in a file located at:\n\n{}\n\nYou can get your API key from:\n\nhttps://platform.openai.com/account/api-keys\n",
        path.display()
    )]
    MissingApiKey { path: PathBuf },

    #[error(
        "You didn't provide a prompt. Please provide a prompt as the arguments to this program.\n\nFor example:\n\n{program} Hello, how are you?\n"
    )]
    EmptyPrompt { program: String },

    #[error("Request failed with status code {status}:\n\n{body}")]
    Status { status: u16, body: String },

    #[error("{kind}: {message}")]
    Api { kind: String, message: String },

    #[error("No choices were returned by the API.")]
    NoChoices,
}

pub type Result<T> = std::result::Result<T, Error>;
