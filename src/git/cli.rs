use crate::domain::{TagPattern, DEFAULT_BRANCH};
use crate::error::{ReleaseError, Result};
use crate::git::{CancelToken, ReleaseGraph};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Captured result of one git invocation
struct GitOutput {
    command: String,
    status: ExitStatus,
    stdout: String,
    stderr: String,
}

impl GitOutput {
    fn into_stdout(self) -> Result<String> {
        if self.status.success() {
            Ok(self.stdout)
        } else {
            Err(self.into_error())
        }
    }

    fn into_error(self) -> ReleaseError {
        ReleaseError::Command {
            command: self.command,
            stderr: self.stderr.trim().to_string(),
        }
    }
}

/// Live release graph backed by the system `git` binary
///
/// Every operation runs one subprocess and blocks until it exits. Each run
/// observes the graph's [CancelToken]: once cancelled, a running child is
/// killed and the call returns [ReleaseError::Cancelled].
#[derive(Debug, Clone)]
pub struct GitCliGraph {
    repo_path: PathBuf,
    remote: String,
    cancel: CancelToken,
}

impl GitCliGraph {
    /// Open the repository containing `path`
    pub fn open(path: &Path) -> Result<Self> {
        let mut graph = GitCliGraph {
            repo_path: path.to_path_buf(),
            remote: "origin".to_string(),
            cancel: CancelToken::new(),
        };
        let top_level = graph.run(&["rev-parse", "--show-toplevel"])?;
        graph.repo_path = PathBuf::from(top_level.trim());
        Ok(graph)
    }

    /// Create a repository at `path` holding a root commit on `main`
    ///
    /// Sets a local identity and disables signing so commits and annotated
    /// tags can be created without user configuration.
    pub fn init(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)?;
        let graph = GitCliGraph {
            repo_path: path.to_path_buf(),
            remote: "origin".to_string(),
            cancel: CancelToken::new(),
        };

        graph.run(&["init", "-q"])?;
        graph.run(&[
            "symbolic-ref",
            "HEAD",
            &format!("refs/heads/{}", DEFAULT_BRANCH),
        ])?;
        graph.run(&["config", "user.name", "monorel"])?;
        graph.run(&["config", "user.email", "monorel@localhost"])?;
        graph.run(&["config", "commit.gpgsign", "false"])?;
        graph.run(&["config", "tag.gpgsign", "false"])?;
        graph.create_commit("initial commit")?;

        Ok(graph)
    }

    /// Use `remote` for pushes and push-state queries
    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    /// Observe `token` for cancellation
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    /// Register a remote (e.g., a bare repository used as `origin`)
    pub fn add_remote(&self, name: &str, url: &str) -> Result<()> {
        self.run(&["remote", "add", name, url])?;
        Ok(())
    }

    fn git_cmd(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(&self.repo_path);
        cmd.arg("-c").arg("core.quotePath=false");
        cmd.arg("-c").arg("advice.detachedHead=false");
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        cmd
    }

    /// Run git to completion, killing it if the cancel token fires
    fn execute(&self, args: &[&str]) -> Result<GitOutput> {
        let command = format!("git {}", args.join(" "));
        if self.cancel.is_cancelled() {
            return Err(ReleaseError::cancelled(command));
        }
        debug!(command = %command, "running git");

        let mut child = self
            .git_cmd()
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ReleaseError::Command {
                command: command.clone(),
                stderr: format!("failed to spawn git: {}", e),
            })?;

        let stdout = child.stdout.take().map(spawn_reader);
        let stderr = child.stderr.take().map(spawn_reader);

        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if self.cancel.is_cancelled() {
                // The child may have exited on its own in the meantime.
                if let Err(e) = child.kill() {
                    debug!(command = %command, error = %e, "kill after cancellation failed");
                }
                child.wait()?;
                return Err(ReleaseError::cancelled(command));
            }
            thread::sleep(POLL_INTERVAL);
        };

        Ok(GitOutput {
            command,
            status,
            stdout: join_reader(stdout),
            stderr: join_reader(stderr),
        })
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        self.execute(args)?.into_stdout()
    }

    /// Run a yes/no git query: exit 0 is `true`, exit 1 is `false`
    fn run_predicate(&self, args: &[&str]) -> Result<bool> {
        let output = self.execute(args)?;
        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(output.into_error()),
        }
    }

    fn resolve(&self, reference: &str) -> Result<String> {
        Ok(self.run(&["rev-parse", "--verify", reference])?.trim().to_string())
    }

    fn require_tag(&self, name: &str) -> Result<()> {
        if self.tag_exists(name)? {
            Ok(())
        } else {
            Err(ReleaseError::not_found(format!("Tag '{}' not found", name)))
        }
    }

    fn require_branch(&self, name: &str) -> Result<()> {
        if self.branch_exists(name)? {
            Ok(())
        } else {
            Err(ReleaseError::not_found(format!("Branch '{}' not found", name)))
        }
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        // A read error only truncates diagnostics; the exit status still decides.
        if pipe.read_to_end(&mut buf).is_err() {
            buf.clear();
        }
        buf
    })
}

fn join_reader(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

impl ReleaseGraph for GitCliGraph {
    fn head(&self) -> Result<String> {
        self.resolve("HEAD")
    }

    fn current_branch(&self) -> Result<Option<String>> {
        let output = self.execute(&["symbolic-ref", "--quiet", "--short", "HEAD"])?;
        match output.status.code() {
            Some(0) => Ok(Some(output.stdout.trim().to_string())),
            Some(1) => Ok(None),
            _ => Err(output.into_error()),
        }
    }

    fn create_commit(&self, message: &str) -> Result<String> {
        self.run(&["commit", "--allow-empty", "--no-verify", "-q", "-m", message])?;
        let hash = self.head()?;
        debug!(commit = %hash, "created commit");
        Ok(hash)
    }

    fn branch_exists(&self, name: &str) -> Result<bool> {
        self.run_predicate(&[
            "rev-parse",
            "--verify",
            "--quiet",
            &format!("refs/heads/{}", name),
        ])
    }

    fn create_branch(&self, name: &str) -> Result<()> {
        if self.branch_exists(name)? {
            return Err(ReleaseError::conflict(format!(
                "Branch '{}' already exists",
                name
            )));
        }
        self.run(&["branch", name])?;
        debug!(branch = name, "created branch");
        Ok(())
    }

    fn checkout_branch(&self, name: &str) -> Result<()> {
        self.require_branch(name)?;
        self.run(&["checkout", "-q", name, "--"])?;
        debug!(branch = name, "checked out branch");
        Ok(())
    }

    fn merge_branch(&self, name: &str) -> Result<String> {
        self.require_branch(name)?;
        let message = format!("Merge branch '{}'", name);
        let before = self.head()?;
        let other = self.resolve(&format!("refs/heads/{}", name))?;

        self.run(&["merge", "--no-ff", "--no-edit", "-q", "-m", &message, name])?;
        let mut merged = self.head()?;

        if merged == before {
            // Already up to date: git made no commit, so record the merge explicitly.
            let tree = self.resolve("HEAD^{tree}")?;
            merged = self
                .run(&["commit-tree", &tree, "-p", &before, "-p", &other, "-m", &message])?
                .trim()
                .to_string();
            self.run(&["update-ref", "-m", &message, "HEAD", &merged])?;
        }

        debug!(branch = name, commit = %merged, "merged branch");
        Ok(merged)
    }

    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool> {
        self.run_predicate(&["merge-base", "--is-ancestor", ancestor, descendant])
    }

    fn create_tag(&self, name: &str, message: &str) -> Result<()> {
        if self.tag_exists(name)? {
            return Err(ReleaseError::conflict(format!("Tag '{}' already exists", name)));
        }
        // Stored with one terminating newline, which tag_annotation removes again.
        let stored = format!("{}\n", message);
        self.run(&["tag", "-a", "--cleanup=verbatim", name, "-m", &stored])?;
        info!(tag = name, "created tag");
        Ok(())
    }

    fn tag_exists(&self, name: &str) -> Result<bool> {
        self.run_predicate(&[
            "rev-parse",
            "--verify",
            "--quiet",
            &format!("refs/tags/{}", name),
        ])
    }

    fn push_tag(&self, name: &str) -> Result<()> {
        self.require_tag(name)?;
        let refspec = format!("refs/tags/{}:refs/tags/{}", name, name);
        self.run(&["push", "--quiet", &self.remote, &refspec])?;
        info!(tag = name, remote = %self.remote, "pushed tag");
        Ok(())
    }

    fn is_tag_pushed(&self, name: &str) -> Result<bool> {
        self.require_tag(name)?;
        let listing = self.run(&[
            "ls-remote",
            "--tags",
            &self.remote,
            &format!("refs/tags/{}", name),
        ])?;
        Ok(!listing.trim().is_empty())
    }

    fn tag_annotation(&self, name: &str) -> Result<String> {
        self.require_tag(name)?;
        // Raw tag object: header lines, a blank line, then the message as stored.
        let object = self.run(&["cat-file", "tag", &format!("refs/tags/{}", name)])?;
        Ok(object
            .split_once("\n\n")
            .map(|(_, message)| message.strip_suffix('\n').unwrap_or(message).to_string())
            .unwrap_or_default())
    }

    fn reachable_tags(&self, pattern: &TagPattern) -> Result<Vec<String>> {
        // Matching happens here; a pattern passed to git would be read as a glob.
        let listing = self.run(&["tag", "--list", "--merged", "HEAD"])?;
        Ok(listing
            .lines()
            .map(str::trim)
            .filter(|name| !name.is_empty() && pattern.matches(name))
            .map(str::to_string)
            .collect())
    }
}
