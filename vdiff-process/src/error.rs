use thiserror::Error;

/// Failure to run an external program to completion.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The program could not be started (missing binary, permissions, ...).
    #[error("Failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran but exited unsuccessfully.
    ///
    /// `output` holds the combined stdout/stderr text for diagnostics.
    #[error("'{program}' exited with {status}: {output}")]
    Exit {
        program: String,
        status: String,
        output: String,
    },
}
