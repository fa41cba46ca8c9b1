use crate::rendering::loader::archive_loader::LoaderSettings;
use clap::{Parser, Subcommand};
use scenepack_files::archive::types::{DEFAULT_MAX_ARCHIVE_SIZE, ExtractorSettings};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "scenepack")]
#[command(version)]
#[command(about = "Resolves glTF scenes packed into ZIP archives")]
pub struct CliArgs {
    /// Archives above this size (in bytes) are rejected before decoding
    #[arg(long, env = "SCENEPACK_MAX_ARCHIVE_SIZE", default_value_t = DEFAULT_MAX_ARCHIVE_SIZE)]
    pub max_archive_size: u64,

    /// Members above this uncompressed size (in bytes) are dropped
    #[arg(long, env = "SCENEPACK_MAX_MEMBER_SIZE")]
    pub max_member_size: Option<u64>,

    /// Never fall back to fetching http(s) references
    #[arg(long, env = "SCENEPACK_OFFLINE")]
    pub offline: bool,

    #[arg(long, env = "SCENEPACK_NETWORK_TIMEOUT_SECS", default_value_t = 30)]
    pub network_timeout_secs: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the extracted members, their classification and the binary buffer pool
    Inspect { archive: PathBuf },
    /// Show which member a reference resolves to, and by which rule
    Resolve {
        archive: PathBuf,
        reference: String,
        /// Directory the reference is relative to, defaults to the scene document's directory
        #[arg(long)]
        base_dir: Option<String>,
    },
    /// Print the scene document with its references rewritten to content handles
    Rewrite {
        archive: PathBuf,
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Load the scene and everything it references through the archive loader
    Load { archive: PathBuf },
}

impl CliArgs {
    pub fn archive(&self) -> &PathBuf {
        match &self.command {
            Command::Inspect { archive }
            | Command::Resolve { archive, .. }
            | Command::Rewrite { archive, .. }
            | Command::Load { archive } => archive,
        }
    }

    pub fn extractor_settings(&self) -> ExtractorSettings {
        ExtractorSettings {
            max_archive_size: self.max_archive_size,
            max_member_size: self.max_member_size,
        }
    }

    pub fn loader_settings(&self) -> LoaderSettings {
        LoaderSettings {
            allow_network: !self.offline,
            network_timeout: Duration::from_secs(self.network_timeout_secs),
            ..LoaderSettings::default()
        }
    }
}

#[cfg(test)]
mod tests;
