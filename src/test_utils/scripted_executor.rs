use std::cell::RefCell;
use std::rc::Rc;

use crate::error::ExecError;
use crate::git::{CommandExecutor, ExecOutput};

/// Canned result for a scripted git command
#[derive(Debug, Clone)]
pub enum Reply {
    Ok { stdout: String, stderr: String },
    Fail { exit_code: i32, stderr: String },
    MissingBinary,
}

impl Reply {
    pub fn stdout(stdout: &str) -> Self {
        Reply::Ok {
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    pub fn ok_with_stderr(stderr: &str) -> Self {
        Reply::Ok {
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    pub fn fail(exit_code: i32, stderr: &str) -> Self {
        Reply::Fail {
            exit_code,
            stderr: stderr.to_string(),
        }
    }

    pub fn missing_binary() -> Self {
        Reply::MissingBinary
    }
}

/// CommandExecutor double that answers from a script and records every call.
///
/// The first rule whose argv is a prefix of the invoked argv wins. Commands
/// without a matching rule succeed with empty output.
#[derive(Default)]
pub struct ScriptedExecutor {
    rules: Vec<(Vec<String>, Reply)>,
    calls: RefCell<Vec<Vec<String>>>,
    journal: Option<Rc<RefCell<Vec<String>>>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, prefix: &[&str], reply: Reply) -> Self {
        self.rules
            .push((prefix.iter().map(|s| s.to_string()).collect(), reply));
        self
    }

    /// Also append `git <args>` to a shared log, to check interleaving with
    /// other observers.
    pub fn with_journal(mut self, journal: Rc<RefCell<Vec<String>>>) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }

    pub fn calls_starting_with(&self, subcommand: &str) -> Vec<Vec<String>> {
        self.calls
            .borrow()
            .iter()
            .filter(|args| args.first().map(String::as_str) == Some(subcommand))
            .cloned()
            .collect()
    }
}

impl CommandExecutor for ScriptedExecutor {
    async fn run(&self, args: &[&str]) -> Result<ExecOutput, ExecError> {
        let argv: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        self.calls.borrow_mut().push(argv.clone());
        if let Some(journal) = &self.journal {
            journal
                .borrow_mut()
                .push(format!("git {}", argv.join(" ")));
        }

        let reply = self
            .rules
            .iter()
            .find(|(prefix, _)| argv.starts_with(prefix))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| Reply::stdout(""));

        match reply {
            Reply::Ok { stdout, stderr } => Ok(ExecOutput::new(stdout, stderr)),
            Reply::Fail { exit_code, stderr } => Err(ExecError::CommandFailed {
                command: argv.first().cloned().unwrap_or_default(),
                exit_code,
                stderr,
            }),
            Reply::MissingBinary => Err(ExecError::BinaryNotFound("git".to_string())),
        }
    }
}
