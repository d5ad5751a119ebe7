use core::fmt::Debug;
use std::{
    fmt::{self, Display},
    io::Write,
    path::Path,
};

use dyn_clone::{DynClone, clone_trait_object};
use eyre::{Context, Result, eyre};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tokio::fs::read_dir;
use tracing::debug;

/// A single generated command line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cmd {
    pub program: String,
    pub args: Vec<String>,
}

impl Cmd {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            std::iter::once(&self.program).chain(&self.args).join(" ")
        )
    }
}

#[typetag::serde(tag = "type")]
pub trait Generator: Debug + DynClone + Send + Sync {
    /// Name of the generator
    fn name(&self) -> &'static str;
    /// Directory whose entries are the benchmark instances
    fn dir(&self) -> &str;
    /// Line printed before any command, if the generator has one
    fn header(&self) -> Option<String> {
        None
    }
    /// Builds the commands for a directory listing, in listing order
    ///
    /// Arguments:
    /// * `listing` - Entry names of [`Generator::dir`], as returned by the host
    fn cmds(&self, listing: &[String]) -> Result<Vec<Cmd>>;
}
clone_trait_object!(Generator);

/// Path of an instance as printed on the command line.
pub fn instance_path(dir: &str, name: &str) -> String {
    format!("{dir}/{name}")
}

/// Names of the immediate children of `dir`, in the order the host returns them.
pub async fn list_instances(dir: impl AsRef<Path>) -> Result<Vec<String>> {
    let dir = dir.as_ref();
    let mut items = read_dir(dir)
        .await
        .context(format!("Listing instance directory {}", dir.display()))?;
    let mut names = Vec::new();
    while let Some(entry) = items
        .next_entry()
        .await
        .context(format!("Reading entry of {}", dir.display()))?
    {
        let name = entry.file_name().into_string().map_err(|name| {
            eyre!(
                "Instance name {name:?} in {} is not valid UTF-8",
                dir.display()
            )
        })?;
        names.push(name);
    }
    debug!("Found {} entries in {}", names.len(), dir.display());
    Ok(names)
}

/// Writes the header and the commands, one per line, flushing each line.
pub fn write_cmds<W: Write>(
    generator: &dyn Generator,
    listing: &[String],
    writer: &mut W,
) -> Result<usize> {
    let cmds = generator
        .cmds(listing)
        .context(format!("Generating {} commands", generator.name()))?;
    if let Some(header) = generator.header() {
        writeln!(writer, "{header}")?;
        writer.flush()?;
    }
    for cmd in &cmds {
        writeln!(writer, "{cmd}")?;
        writer.flush()?;
    }
    debug!("{} wrote {} commands", generator.name(), cmds.len());
    Ok(cmds.len())
}

/// Lists the generator's directory and writes its commands.
pub async fn generate<W: Write>(generator: &dyn Generator, writer: &mut W) -> Result<usize> {
    let listing = list_instances(generator.dir()).await?;
    write_cmds(generator, &listing, writer)
}
