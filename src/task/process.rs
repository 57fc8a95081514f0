use {
    super::{job::Job, job_policy::*, *},
    crate::error::*,
    crate::object::*,
    alloc::collections::BTreeMap,
    alloc::sync::{Arc, Weak},
    spin::Mutex,
};

/// Process abstraction
///
/// ## SYNOPSIS
///
/// A process is an instance of a program in the traditional sense: a set of
/// instructions which will be executed by one or more threads, along with a
/// collection of resources.
///
/// ## DESCRIPTION
///
/// Processes are owned by [jobs](super::Job) and allow an application that is
/// composed by more than one process to be treated as a single entity, from
/// the perspective of resource and permission limits, as well as lifetime
/// control.
///
/// Only the job-facing half of the process is modeled here: membership in the
/// owning job, the policy snapshot inherited from it, the handle table, and
/// termination. Threads and memory belong to other subsystems.
///
/// ### Lifetime
///
/// The process stops when:
/// - the process calls [`Process::exit()`]
/// - the parent job terminates the process
/// - the parent job is destroyed
pub struct Process {
    base: KObjectBase,
    job: Weak<Job>,
    policy: JobPolicy,
    inner: Mutex<ProcessInner>,
}

impl_kobject!(Process
    fn related_koid(&self) -> KoID {
        self.job.upgrade().map(|job| job.id()).unwrap_or(0)
    }
);

#[derive(Default)]
struct ProcessInner {
    exit_code: Option<i64>,
    handles: BTreeMap<HandleValue, Handle>,
}

impl Process {
    /// Create a new process in the `job`.
    ///
    /// Fails with `BAD_STATE` if the job is no longer accepting members.
    pub fn create(job: &Arc<Job>, name: &str) -> ZxResult<Arc<Self>> {
        let proc = Arc::new(Process {
            base: KObjectBase::new(),
            job: Arc::downgrade(job),
            policy: job.policy(),
            inner: Mutex::new(ProcessInner::default()),
        });
        proc.base.set_name(name);
        job.add_process(proc.clone())?;
        Ok(proc)
    }

    /// Exit the current process with `retcode`.
    pub fn exit(&self, retcode: i64) {
        self.terminate(retcode);
    }

    /// Kill the process, settling on `retcode`.
    ///
    /// Returns `false` without effect if the process already terminated;
    /// the first termination wins.
    pub fn kill(&self, retcode: i64) -> bool {
        self.terminate(retcode)
    }

    fn terminate(&self, retcode: i64) -> bool {
        let mut inner = self.inner.lock();
        if inner.exit_code.is_some() {
            return false;
        }
        inner.exit_code = Some(retcode);
        drop(inner);
        self.base.signal_set(Signal::PROCESS_TERMINATED);
        if let Some(job) = self.job.upgrade() {
            job.process_exit(self.base.id, retcode);
        }
        true
    }

    /// The exit code, or `None` while the process is alive.
    pub fn exit_code(&self) -> Option<i64> {
        self.inner.lock().exit_code
    }

    /// Get the owning job.
    pub fn job(&self) -> Option<Arc<Job>> {
        self.job.upgrade()
    }

    /// Check whether `condition` is allowed in the parent job's policy.
    pub fn check_policy(&self, condition: PolicyCondition) -> ZxResult {
        match self
            .policy
            .get_action(condition)
            .unwrap_or(PolicyAction::Allow)
        {
            PolicyAction::Allow => Ok(()),
            PolicyAction::Deny => Err(ZxError::ACCESS_DENIED),
            _ => Err(ZxError::NOT_SUPPORTED),
        }
    }

    /// Add a handle to the process
    pub fn add_handle(&self, handle: Handle) -> HandleValue {
        self.inner.lock().add_handle(handle)
    }

    /// Remove a handle from the process
    pub fn remove_handle(&self, handle_value: HandleValue) -> ZxResult {
        match self.inner.lock().handles.remove(&handle_value) {
            Some(_) => Ok(()),
            None => Err(ZxError::BAD_HANDLE),
        }
    }

    /// Get a handle from the process
    fn get_handle(&self, handle_value: HandleValue) -> ZxResult<Handle> {
        self.inner
            .lock()
            .handles
            .get(&handle_value)
            .cloned()
            .ok_or(ZxError::BAD_HANDLE)
    }

    /// Duplicate a handle with new `rights`, return the new handle value.
    ///
    /// The handle must have `Rights::DUPLICATE`.
    /// To duplicate the handle with the same rights use `Rights::SAME_RIGHTS`.
    /// If different rights are desired they must be strictly lesser than of the source handle,
    /// or an `ZxError::ACCESS_DENIED` will be raised.
    pub fn dup_handle(&self, handle_value: HandleValue, rights: Rights) -> ZxResult<HandleValue> {
        let mut inner = self.inner.lock();
        let mut handle = match inner.handles.get(&handle_value) {
            Some(h) => h.clone(),
            None => return Err(ZxError::BAD_HANDLE),
        };
        if !handle.rights.contains(Rights::DUPLICATE) {
            return Err(ZxError::ACCESS_DENIED);
        }
        if !rights.contains(Rights::SAME_RIGHTS) {
            // `rights` must be strictly lesser than of the source handle
            if !(handle.rights.contains(rights) && handle.rights != rights) {
                return Err(ZxError::INVALID_ARGS);
            }
            handle.rights = rights;
        }
        let new_handle_value = inner.add_handle(handle);
        Ok(new_handle_value)
    }

    /// Get the kernel object corresponding to this `handle_value`,
    /// after checking that this handle has the `desired_rights`.
    pub fn get_object_with_rights<T: KernelObject>(
        &self,
        handle_value: HandleValue,
        desired_rights: Rights,
    ) -> ZxResult<Arc<T>> {
        let handle = self.get_handle(handle_value)?;
        // check type before rights
        let object = handle
            .object
            .downcast_arc::<T>()
            .map_err(|_| ZxError::WRONG_TYPE)?;
        if !handle.rights.contains(desired_rights) {
            return Err(ZxError::ACCESS_DENIED);
        }
        Ok(object)
    }

    /// Get the kernel object corresponding to this `handle_value`
    pub fn get_object<T: KernelObject>(&self, handle_value: HandleValue) -> ZxResult<Arc<T>> {
        let handle = self.get_handle(handle_value)?;
        let object = handle
            .object
            .downcast_arc::<T>()
            .map_err(|_| ZxError::WRONG_TYPE)?;
        Ok(object)
    }
}

impl Task for Process {
    fn kill(&self) {
        self.kill(TASK_RETCODE_SYSCALL_KILL);
    }
}

impl ProcessInner {
    /// Add a handle to the process
    fn add_handle(&mut self, handle: Handle) -> HandleValue {
        let value = (0 as HandleValue..)
            .find(|idx| !self.handles.contains_key(idx))
            .unwrap();
        self.handles.insert(value, handle);
        debug!("a new handle is added: {}", value);
        value
    }
}
