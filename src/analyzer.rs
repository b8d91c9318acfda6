//! The scene analyzer collaborator.
//!
//! A [`SceneAnalyzer`] turns one compressed frame into a [`SceneAnalysis`].
//! The crate does not ship a model; it ships the boundary plus
//! [`CommandAnalyzer`], which delegates to any external program that reads
//! a JPEG on stdin and prints JSON on stdout.
//!
//! Closures implement the trait directly:
//!
//! ```
//! use scenecut::{AnalyzerError, SceneAnalysis, SceneAnalyzer, Thumbnail};
//!
//! let analyzer = |thumbnail: &Thumbnail| -> Result<SceneAnalysis, AnalyzerError> {
//!     Ok(SceneAnalysis::new(
//!         format!("{}x{} frame", thumbnail.width, thumbnail.height),
//!         ["frame"],
//!     ))
//! };
//! # fn takes(_: &dyn SceneAnalyzer) {}
//! # takes(&analyzer);
//! ```

use std::{
    ffi::OsString,
    io::Write,
    path::{Path, PathBuf},
    process::{Command, Stdio},
    thread,
};

use crate::{
    error::AnalyzerError,
    scene::{SceneAnalysis, Thumbnail},
};

/// Turns one frame into a description and tags.
///
/// Implementations must be [`Send`] and [`Sync`]: the async driver calls
/// them from blocking worker threads.
pub trait SceneAnalyzer: Send + Sync {
    /// One-time setup before a batch. A failure here fails the whole batch
    /// rather than any single scene.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzerError::Unavailable`] when the analyzer cannot run.
    fn prepare(&self) -> Result<(), AnalyzerError> {
        Ok(())
    }

    /// Analyze one thumbnail.
    ///
    /// # Errors
    ///
    /// Any error marks only this scene as failed.
    fn analyze(&self, thumbnail: &Thumbnail) -> Result<SceneAnalysis, AnalyzerError>;
}

impl<F> SceneAnalyzer for F
where
    F: Fn(&Thumbnail) -> Result<SceneAnalysis, AnalyzerError> + Send + Sync,
{
    fn analyze(&self, thumbnail: &Thumbnail) -> Result<SceneAnalysis, AnalyzerError> {
        self(thumbnail)
    }
}

/// Runs an external program per scene.
///
/// The JPEG bytes are written to the program's stdin; its stdout must be a
/// JSON object `{"description": "...", "tags": ["...", ...]}`. A non-zero
/// exit status or unparsable output fails that scene.
///
/// # Example
///
/// ```no_run
/// use scenecut::CommandAnalyzer;
///
/// let analyzer = CommandAnalyzer::new("describe-frame").with_arg("--json");
/// ```
#[derive(Debug, Clone)]
pub struct CommandAnalyzer {
    program: PathBuf,
    args: Vec<OsString>,
}

impl CommandAnalyzer {
    /// Analyze with `program`, resolved through `PATH` when it is a bare name.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The program this analyzer runs.
    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl SceneAnalyzer for CommandAnalyzer {
    fn prepare(&self) -> Result<(), AnalyzerError> {
        let resolved = which::which(&self.program).map_err(|error| {
            AnalyzerError::Unavailable(format!(
                "analyzer program {} is not runnable: {error}",
                self.program.display()
            ))
        })?;
        log::debug!("Using analyzer program {}", resolved.display());
        Ok(())
    }

    fn analyze(&self, thumbnail: &Thumbnail) -> Result<SceneAnalysis, AnalyzerError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|error| {
                AnalyzerError::Unavailable(format!(
                    "failed to start {}: {error}",
                    self.program.display()
                ))
            })?;

        // Feed stdin from another thread so a chatty child cannot fill its
        // stdout pipe while we are still writing.
        let stdin = child.stdin.take();
        let payload = thumbnail.data.clone();
        let writer = thread::spawn(move || match stdin {
            Some(mut stdin) => stdin.write_all(&payload),
            None => Ok(()),
        });

        let output = child
            .wait_with_output()
            .map_err(|error| AnalyzerError::Failed(error.to_string()))?;

        match writer.join() {
            Ok(Ok(())) => {}
            Ok(Err(error)) => {
                log::debug!("Analyzer closed stdin early: {error}");
            }
            Err(_) => {
                return Err(AnalyzerError::Failed(
                    "stdin writer thread panicked".to_string(),
                ));
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AnalyzerError::Failed(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        serde_json::from_slice::<SceneAnalysis>(&output.stdout)
            .map_err(|error| AnalyzerError::InvalidResponse(error.to_string()))
    }
}
