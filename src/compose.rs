//! Argument-vector builders for the compose tool.
//!
//! `COMPOSE_CMD` may name a single binary (`docker-compose`) or a binary plus
//! leading arguments (`docker compose`, `podman compose`). The configured
//! prefix is split on whitespace once, and every command is built on top of it.

use crate::errors::ConfigError;
use crate::process::CommandSpec;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compose {
    program: String,
    prefix: Vec<String>,
}

impl Compose {
    /// Parse a compose command line such as `"docker compose"`.
    pub fn parse(command: &str) -> Result<Self, ConfigError> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or(ConfigError::EmptyComposeCommand)?;
        Ok(Self {
            program,
            prefix: parts.collect(),
        })
    }

    /// The configured command line, re-joined.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.prefix.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// `<compose> <args...>`
    pub fn command<I, S>(&self, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec::new(&self.program)
            .args(self.prefix.iter().cloned())
            .args(args)
    }

    /// Start building `<compose> exec ... <service> <args...>`.
    pub fn exec<'a>(&'a self, service: &'a str) -> Exec<'a> {
        Exec {
            compose: self,
            service,
            workdir: None,
            user: None,
            tty: true,
        }
    }
}

/// Builder for `compose exec`.
#[derive(Debug, Clone)]
pub struct Exec<'a> {
    compose: &'a Compose,
    service: &'a str,
    workdir: Option<&'a str>,
    user: Option<&'a str>,
    tty: bool,
}

impl<'a> Exec<'a> {
    pub fn workdir(mut self, workdir: &'a str) -> Self {
        self.workdir = Some(workdir);
        self
    }

    pub fn user(mut self, user: &'a str) -> Self {
        self.user = Some(user);
        self
    }

    /// Pass `-T`: no pseudo-TTY. Required when output is captured.
    pub fn no_tty(mut self) -> Self {
        self.tty = false;
        self
    }

    pub fn run<I, S>(self, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut flags: Vec<String> = vec!["exec".to_string()];
        if !self.tty {
            flags.push("-T".to_string());
        }
        if let Some(user) = self.user {
            flags.push("-u".to_string());
            flags.push(user.to_string());
        }
        if let Some(workdir) = self.workdir {
            flags.push("-w".to_string());
            flags.push(workdir.to_string());
        }
        flags.push(self.service.to_string());
        self.compose.command(flags).args(args)
    }
}
