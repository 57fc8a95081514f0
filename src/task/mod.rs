//! Objects for Task Management.

mod exception;
mod job;
mod job_policy;
mod process;

pub use {self::exception::*, self::job::*, self::job_policy::*, self::process::*};

/// Task (Process or Job).
pub trait Task: Sync + Send {
    /// Kill the task. The return code used is [`TASK_RETCODE_SYSCALL_KILL`].
    fn kill(&self);
}

/// The return code set when a task is killed via `zx_task_kill()`.
pub const TASK_RETCODE_SYSCALL_KILL: i64 = -1024;

/// The return code set when a job is killed by the out-of-memory handler.
pub const TASK_RETCODE_OOM_KILL: i64 = -1028;

/// The return code set when a job is killed because its critical process exited.
pub const TASK_RETCODE_CRITICAL_PROCESS_KILL: i64 = -1029;
