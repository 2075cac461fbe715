use std::path::PathBuf;

use clap::{ArgAction, Parser};
use unspool_archive::{ArchiveRequest, ExistingDirectory, TraversalPolicy};
use unspool_fs::Ownership;

#[derive(Clone, Debug, Parser)]
#[command(name = "unspool", version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
pub struct App {
    /// Archive to extract (.tar, .tgz, .tar.gz, .tbz, .tar.bz2)
    pub source: PathBuf,

    /// Existing directory to extract into
    pub destination: PathBuf,

    /// Leading path segments to drop from every entry name
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub strip_components: usize,

    /// Owner of extracted entries, as a name or uid [default: current user]
    #[arg(long, value_name = "USER")]
    pub owner: Option<String>,

    /// Group of extracted entries, as a name or gid [default: current group]
    #[arg(long, value_name = "GROUP")]
    pub group: Option<String>,

    /// Accept directories that already exist instead of failing
    #[arg(long)]
    pub reuse_existing_dirs: bool,

    /// Fail on entry names containing `..` segments
    #[arg(long)]
    pub reject_traversal: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl App {
    pub fn request(&self) -> ArchiveRequest {
        let current = Ownership::current();
        let owner = self
            .owner
            .clone()
            .unwrap_or_else(|| current.uid().to_string());
        let group = self
            .group
            .clone()
            .unwrap_or_else(|| current.gid().to_string());

        let mut request = ArchiveRequest::new(&self.source, &self.destination, owner, group)
            .strip_components(self.strip_components);
        if self.reuse_existing_dirs {
            request = request.existing_directories(ExistingDirectory::Reuse);
        }
        if self.reject_traversal {
            request = request.traversal(TraversalPolicy::Reject);
        }
        request
    }

    /// Filter used when `RUST_LOG` is unset.
    pub fn default_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn,unspool=info,unspool_archive=info",
            1 => "info,unspool=debug,unspool_archive=debug,unspool_fs=debug",
            _ => "debug,unspool=trace,unspool_archive=trace,unspool_fs=trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_arguments_only() {
        let app = App::try_parse_from(["unspool", "pkg.tgz", "/opt/pkg"]).unwrap();
        let request = app.request();
        let current = Ownership::current();

        assert_eq!(request.source_path, PathBuf::from("pkg.tgz"));
        assert_eq!(request.destination_dir, PathBuf::from("/opt/pkg"));
        assert_eq!(request.strip_components, 0);
        assert_eq!(request.owner, current.uid().to_string());
        assert_eq!(request.group, current.gid().to_string());
        assert_eq!(request.existing_directories, ExistingDirectory::Fail);
        assert_eq!(request.traversal, TraversalPolicy::Allow);
    }

    #[test]
    fn flags_map_onto_request() {
        let app = App::try_parse_from([
            "unspool",
            "pkg.tar.bz2",
            "out",
            "--strip-components",
            "1",
            "--owner",
            "svc",
            "--group",
            "staff",
            "--reuse-existing-dirs",
            "--reject-traversal",
            "-vv",
        ])
        .unwrap();
        let request = app.request();

        assert_eq!(request.strip_components, 1);
        assert_eq!(request.owner, "svc");
        assert_eq!(request.group, "staff");
        assert_eq!(request.existing_directories, ExistingDirectory::Reuse);
        assert_eq!(request.traversal, TraversalPolicy::Reject);
        assert_eq!(app.verbose, 2);
        assert!(app.default_filter().contains("unspool_archive=trace"));
    }

    #[test]
    fn destination_is_required() {
        assert!(App::try_parse_from(["unspool", "pkg.tar"]).is_err());
    }
}
