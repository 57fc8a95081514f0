use {
    super::{exception::*, job_policy::*, process::Process, *},
    crate::error::*,
    crate::object::*,
    alloc::boxed::Box,
    alloc::sync::{Arc, Weak},
    alloc::vec,
    alloc::vec::Vec,
    spin::Mutex,
};

/// The maximum height of the job tree: a direct child of the root job may
/// carry at most this many further generations below it.
pub const ROOT_JOB_MAX_HEIGHT: u32 = 32;

/// Capacity of the out-of-memory candidate buffer. Jobs found beyond it are
/// skipped with a diagnostic.
pub const OOM_CANDIDATES_MAX: usize = 32;

/// Control a group of processes
///
/// ## SYNOPSIS
///
/// A job is a group of processes and possibly other (child) jobs. Jobs are used to
/// track privileges to perform kernel operations (i.e., make various syscalls,
/// with various options), and track and limit basic resource (e.g., memory, CPU)
/// consumption. Every process belongs to a single job. Jobs can also be nested,
/// and every job except the root job also belongs to a single (parent) job.
///
/// ## DESCRIPTION
///
/// A job is an object consisting of the following:
/// - a reference to a parent job
/// - a set of child jobs (each of whom has this job as parent)
/// - a set of member [processes](super::Process)
/// - a set of policies
///
/// Jobs control "applications" that are composed of more than one process to be
/// controlled as a single entity.
///
/// ## LIFECYCLE
///
/// A job starts out `Ready` and accepts members. [`Job::kill`] moves it to
/// `Killing` and tears the subtree down depth-first; once the last member is
/// gone the job becomes `Dead`, raises `JOB_TERMINATED`, shuts down its
/// exception channels and unlinks from its parent. The transitions are
/// irreversible.
pub struct Job {
    base: KObjectBase,
    self_ref: Weak<Job>,
    parent: Option<Weak<Job>>,
    parent_policy: JobPolicy,
    max_height: u32,
    exceptionate: Arc<Exceptionate>,
    debug_exceptionate: Arc<Exceptionate>,
    inner: Mutex<JobInner>,
}

impl_kobject!(Job
    fn get_child(&self, id: KoID) -> ZxResult<Arc<dyn KernelObject>> {
        let inner = self.inner.lock();
        if let Some(job) = inner.children.iter().find(|o| o.id() == id) {
            return Ok(job.clone());
        }
        if let Some(proc) = inner.processes.iter().find(|o| o.id() == id) {
            return Ok(proc.clone());
        }
        Err(ZxError::NOT_FOUND)
    }
    fn related_koid(&self) -> KoID {
        self.parent().map(|parent| parent.id()).unwrap_or(0)
    }
);

/// The life-cycle state of a job. Transitions only run forward.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum JobState {
    /// Accepting new members.
    Ready,
    /// `kill` was called; waiting for the members to go away.
    Killing,
    /// Terminal: no members, unlinked from the parent.
    Dead,
}

impl Default for JobState {
    fn default() -> Self {
        JobState::Ready
    }
}

#[derive(Default)]
struct JobInner {
    policy: JobPolicy,
    timer_policy: TimerSlack,
    state: JobState,
    return_code: i64,
    kill_on_oom: bool,
    children: Vec<Arc<Job>>,
    processes: Vec<Arc<Process>>,
    critical_proc: Option<(KoID, bool)>,
    depleted_callback: Option<Box<dyn FnOnce() + Send>>,
}

impl JobInner {
    fn is_empty(&self) -> bool {
        self.processes.is_empty() && self.children.is_empty()
    }

    fn ready_for_dead_transition(&self) -> bool {
        self.state == JobState::Killing && self.is_empty()
    }
}

impl Job {
    /// Create the root job.
    pub fn root() -> Arc<Self> {
        Arc::new_cyclic(|weak| Job {
            base: KObjectBase::with_signal(Signal::JOB_NO_JOBS | Signal::JOB_NO_PROCESSES),
            self_ref: weak.clone(),
            parent: None,
            parent_policy: JobPolicy::default(),
            max_height: ROOT_JOB_MAX_HEIGHT,
            exceptionate: Exceptionate::new(ExceptionChannelType::Job),
            debug_exceptionate: Exceptionate::new(ExceptionChannelType::JobDebugger),
            inner: Mutex::new(JobInner::default()),
        })
    }

    /// Create a new child job object.
    ///
    /// The child inherits a snapshot of this job's effective policy and a
    /// `max_height` one less than this job's. Fails with `OUT_OF_RANGE` when
    /// the height is exhausted and with `BAD_STATE` once the job is dying.
    pub fn create_child(&self) -> ZxResult<Arc<Self>> {
        if self.max_height == 0 {
            return Err(ZxError::OUT_OF_RANGE);
        }
        let mut inner = self.inner.lock();
        if inner.state != JobState::Ready {
            return Err(ZxError::BAD_STATE);
        }
        let child = Arc::new_cyclic(|weak| Job {
            base: KObjectBase::with_signal(Signal::JOB_NO_JOBS | Signal::JOB_NO_PROCESSES),
            self_ref: weak.clone(),
            parent: Some(self.self_ref.clone()),
            parent_policy: inner.policy.merge(&self.parent_policy),
            max_height: self.max_height - 1,
            exceptionate: Exceptionate::new(ExceptionChannelType::Job),
            debug_exceptionate: Exceptionate::new(ExceptionChannelType::JobDebugger),
            inner: Mutex::new(JobInner::default()),
        });
        // the newest child goes to the tail; enumeration sees older ones first
        inner.children.push(child.clone());
        // the emptiness signal moves together with the list, under its lock
        self.base.signal_clear(Signal::JOB_NO_JOBS);
        Ok(child)
    }

    /// Get the parent job.
    pub fn parent(&self) -> Option<Arc<Job>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// The remaining permitted tree depth below this job.
    pub fn max_height(&self) -> u32 {
        self.max_height
    }

    /// Number of live child jobs.
    pub fn job_count(&self) -> usize {
        self.inner.lock().children.len()
    }

    /// Number of live member processes.
    pub fn process_count(&self) -> usize {
        self.inner.lock().processes.len()
    }

    /// Get the effective policy of the job.
    pub fn policy(&self) -> JobPolicy {
        self.inner.lock().policy.merge(&self.parent_policy)
    }

    /// Sets one or more security and/or resource policies to an empty job.
    ///
    /// The job's effective policies is the combination of the parent's
    /// effective policies and the policies specified in policy.
    ///
    /// After this call succeeds any new child process or child job will have
    /// the new effective policy applied to it.
    pub fn set_policy_basic(
        &self,
        options: SetPolicyOptions,
        policies: &[BasicPolicy],
    ) -> ZxResult {
        let mut inner = self.inner.lock();
        if !inner.is_empty() {
            return Err(ZxError::BAD_STATE);
        }
        for policy in policies {
            if self.parent_policy.get_override(policy.condition) == Some(PolicyOverride::Deny) {
                match options {
                    SetPolicyOptions::Absolute => return Err(ZxError::ALREADY_EXISTS),
                    SetPolicyOptions::Relative => {}
                }
            } else {
                inner.policy.apply(*policy);
            }
        }
        Ok(())
    }

    /// Sets policies in the v2 rule format, where each rule carries its own
    /// override mode. Otherwise behaves like [`Job::set_policy_basic`].
    pub fn set_policy_basic_v2(
        &self,
        options: SetPolicyOptions,
        policies: &[BasicPolicyV2],
    ) -> ZxResult {
        let mut inner = self.inner.lock();
        if !inner.is_empty() {
            return Err(ZxError::BAD_STATE);
        }
        for policy in policies {
            if self.parent_policy.get_override(policy.condition) == Some(PolicyOverride::Deny) {
                match options {
                    SetPolicyOptions::Absolute => return Err(ZxError::ALREADY_EXISTS),
                    SetPolicyOptions::Relative => {}
                }
            } else {
                inner.policy.apply_v2(*policy);
            }
        }
        Ok(())
    }

    /// Sets the timer slack policy to an empty job.
    ///
    /// The new slack amount never decreases the existing one.
    pub fn set_policy_timer_slack(&self, policy: TimerSlackPolicy) -> ZxResult {
        let mut inner = self.inner.lock();
        if !inner.is_empty() {
            return Err(ZxError::BAD_STATE);
        }
        check_timer_policy(&policy)?;
        inner.timer_policy = inner.timer_policy.generate_new(policy);
        Ok(())
    }

    /// The effective timer slack of the job.
    pub fn timer_slack(&self) -> TimerSlack {
        self.inner.lock().timer_policy
    }

    /// Set a process as critical to the job.
    ///
    /// When process terminates, job will be terminated as if `task_kill()` was
    /// called on it. The return code used will be
    /// [`TASK_RETCODE_CRITICAL_PROCESS_KILL`].
    ///
    /// The process must be a direct member of this job.
    ///
    /// If `retcode_nonzero` is true, then job will only be terminated if process
    /// has a non-zero return code.
    pub fn set_critical(&self, proc: &Arc<Process>, retcode_nonzero: bool) -> ZxResult {
        let mut inner = self.inner.lock();
        if inner.critical_proc.is_some() {
            return Err(ZxError::ALREADY_BOUND);
        }
        if !inner.processes.iter().any(|p| p.id() == proc.id()) {
            return Err(ZxError::INVALID_ARGS);
        }
        inner.critical_proc = Some((proc.id(), retcode_nonzero));
        Ok(())
    }

    /// Whether the job is tagged for killing by the out-of-memory handler.
    pub fn kill_on_oom(&self) -> bool {
        self.inner.lock().kill_on_oom
    }

    /// Tag or untag the job for killing by the out-of-memory handler.
    /// Settable at any time.
    pub fn set_kill_on_oom(&self, value: bool) {
        self.inner.lock().kill_on_oom = value;
    }

    /// Register a callback invoked once, when the job's last child job and
    /// last member process are both gone.
    ///
    /// The kernel registers this on the root job: a depleted root job means
    /// there is no more userspace, and the system halts.
    pub fn set_depleted_callback(&self, callback: impl FnOnce() + Send + 'static) {
        self.inner.lock().depleted_callback = Some(Box::new(callback));
    }

    /// Add a process to the job.
    pub(super) fn add_process(&self, process: Arc<Process>) -> ZxResult {
        let mut inner = self.inner.lock();
        if inner.state != JobState::Ready {
            return Err(ZxError::BAD_STATE);
        }
        inner.processes.push(process);
        self.base.signal_clear(Signal::JOB_NO_PROCESSES);
        Ok(())
    }

    /// Called by a member process on its termination.
    pub(super) fn process_exit(&self, id: KoID, retcode: i64) {
        let mut inner = self.inner.lock();
        let before = inner.processes.len();
        inner.processes.retain(|proc| proc.id() != id);
        if inner.processes.len() == before {
            // already unlinked, e.g. a kill racing an exit
            return;
        }
        if inner.processes.is_empty() {
            self.base.signal_set(Signal::JOB_NO_PROCESSES);
        }
        let critical = matches!(
            inner.critical_proc,
            Some((pid, retcode_nonzero)) if pid == id && !(retcode_nonzero && retcode == 0)
        );
        let ready_for_dead = inner.ready_for_dead_transition();
        drop(inner);
        self.check_depleted();
        if ready_for_dead {
            self.finish_dead_transition();
        } else if critical {
            info!("critical process {} exited, killing job {}", id, self.base.id);
            self.kill(TASK_RETCODE_CRITICAL_PROCESS_KILL);
        }
    }

    /// Kill the job and all its descendants.
    ///
    /// Returns `false` without effect unless the job was still `Ready`; the
    /// first call records `return_code` as the job's termination code. When
    /// this returns the job is at least `Killing`; waiters observe `Dead`
    /// through the `JOB_TERMINATED` signal.
    pub fn kill(&self, return_code: i64) -> bool {
        let this = match self.self_ref.upgrade() {
            Some(job) => job,
            None => return false,
        };
        if !self.begin_kill(return_code) {
            return false;
        }
        info!("killing job {}", self.base.id);
        // Depth-first teardown over an explicit worklist: child jobs are
        // moved to `Killing` before any process at their level dies, and a
        // job with no members dies on the spot. Everything else completes
        // through the unlink notifications of the dying members.
        let mut worklist = vec![this];
        while let Some(job) = worklist.pop() {
            let (children, processes) = job.snapshot_members();
            if children.is_empty() && processes.is_empty() {
                job.finish_dead_transition();
                continue;
            }
            for child in children {
                if child.begin_kill(return_code) {
                    worklist.push(child);
                }
            }
            for proc in processes {
                proc.kill(return_code);
            }
        }
        true
    }

    /// Move the job to `Killing` and record `return_code`.
    fn begin_kill(&self, return_code: i64) -> bool {
        let mut inner = self.inner.lock();
        if inner.state != JobState::Ready {
            return false;
        }
        inner.state = JobState::Killing;
        inner.return_code = return_code;
        true
    }

    /// Complete the `Killing -> Dead` transition, then walk up the tree:
    /// unlinking from the parent may leave an ancestor ready for its own
    /// transition.
    fn finish_dead_transition(&self) {
        self.make_dead();
        let mut id = self.base.id;
        let mut parent = self.parent();
        while let Some(job) = parent {
            match job.unlink_child_job(id) {
                Some(true) => {
                    job.make_dead();
                    id = job.base.id;
                    parent = job.parent();
                }
                _ => break,
            }
        }
    }

    /// The terminal half of the dead transition for a single job.
    fn make_dead(&self) {
        self.inner.lock().state = JobState::Dead;
        debug!("job {} is dead", self.base.id);
        self.exceptionate.shutdown();
        self.debug_exceptionate.shutdown();
        self.base.signal_set(Signal::JOB_TERMINATED);
    }

    /// Unlink the child job `id`. Returns `None` if it was not linked,
    /// otherwise whether the removal left this job ready to complete its own
    /// dead transition.
    fn unlink_child_job(&self, id: KoID) -> Option<bool> {
        let mut inner = self.inner.lock();
        let before = inner.children.len();
        inner.children.retain(|job| job.base.id != id);
        if inner.children.len() == before {
            return None;
        }
        if inner.children.is_empty() {
            self.base.signal_set(Signal::JOB_NO_JOBS);
        }
        let ready_for_dead = inner.ready_for_dead_transition();
        drop(inner);
        self.check_depleted();
        Some(ready_for_dead)
    }

    /// Invoke the depleted callback when the last member is gone.
    fn check_depleted(&self) {
        let mut inner = self.inner.lock();
        if !inner.is_empty() {
            return;
        }
        if let Some(callback) = inner.depleted_callback.take() {
            drop(inner);
            callback();
        }
    }

    /// Called by the out-of-memory handler: pick one `kill_on_oom` job in
    /// this subtree and kill it with [`TASK_RETCODE_OOM_KILL`].
    ///
    /// Candidates are tried in descending `max_height` order, so the most
    /// specific tagged subtree goes first. Returns `true` as soon as one
    /// candidate was actually transitioned; `false` if no candidate could be
    /// killed.
    pub fn kill_job_with_kill_on_oom(&self) -> bool {
        let mut candidates = Vec::new();
        let mut worklist = match self.self_ref.upgrade() {
            Some(job) => vec![job],
            None => return false,
        };
        while let Some(job) = worklist.pop() {
            let (tagged, children) = {
                let inner = job.inner.lock();
                (inner.kill_on_oom, inner.children.clone())
            };
            if tagged {
                if candidates.len() < OOM_CANDIDATES_MAX {
                    candidates.push(job.clone());
                } else {
                    warn!("OOM candidate buffer is full, skipping job {}", job.base.id);
                }
            }
            worklist.extend(children);
        }
        candidates.sort_by_key(|job| job.max_height);
        for job in candidates.iter().rev() {
            if job.kill(TASK_RETCODE_OOM_KILL) {
                return true;
            }
        }
        false
    }

    /// Walk the live members with `visitor`. The job's own processes come
    /// first; every child job is then visited and, with `recurse`, descended
    /// into before its next sibling. Returns `false` if the visitor stopped
    /// the walk.
    pub fn enumerate_children(&self, visitor: &mut dyn JobEnumerator, recurse: bool) -> bool {
        let (children, processes) = self.snapshot_members();
        for proc in processes.iter() {
            if !visitor.on_process(proc) {
                return false;
            }
        }
        if !recurse {
            return children.iter().all(|job| visitor.on_job(job));
        }
        let mut worklist = children;
        worklist.reverse();
        while let Some(job) = worklist.pop() {
            if !visitor.on_job(&job) {
                return false;
            }
            let (children, processes) = job.snapshot_members();
            for proc in processes.iter() {
                if !visitor.on_process(proc) {
                    return false;
                }
            }
            worklist.extend(children.into_iter().rev());
        }
        true
    }

    /// Snapshot the member lists so visitors run without the lock held.
    fn snapshot_members(&self) -> (Vec<Arc<Job>>, Vec<Arc<Process>>) {
        let inner = self.inner.lock();
        (inner.children.clone(), inner.processes.clone())
    }

    /// Find a direct child job by koid. Absence is not an error.
    pub fn lookup_job_by_id(&self, id: KoID) -> Option<Arc<Job>> {
        let inner = self.inner.lock();
        inner.children.iter().find(|job| job.id() == id).cloned()
    }

    /// Find a direct member process by koid. Absence is not an error.
    pub fn lookup_process_by_id(&self, id: KoID) -> Option<Arc<Process>> {
        let inner = self.inner.lock();
        inner.processes.iter().find(|proc| proc.id() == id).cloned()
    }

    /// Get information of the job.
    pub fn get_info(&self) -> JobInfo {
        let inner = self.inner.lock();
        JobInfo {
            return_code: inner.return_code,
            exited: inner.state == JobState::Dead,
            kill_on_oom: inner.kill_on_oom,
            debugger_attached: self.debug_exceptionate.has_channel(),
            padding: Default::default(),
        }
    }

    /// The exception channel endpoint of the job.
    pub fn exceptionate(&self) -> Arc<Exceptionate> {
        self.exceptionate.clone()
    }

    /// The debugger exception channel endpoint of the job.
    pub fn debug_exceptionate(&self) -> Arc<Exceptionate> {
        self.debug_exceptionate.clone()
    }
}

impl Task for Job {
    fn kill(&self) {
        self.kill(TASK_RETCODE_SYSCALL_KILL);
    }
}

/// Visitor for [`Job::enumerate_children`].
pub trait JobEnumerator {
    /// Called on each live member process. Return `false` to stop the walk.
    fn on_process(&mut self, _proc: &Arc<Process>) -> bool {
        true
    }

    /// Called on each live child job. Return `false` to stop the walk.
    fn on_job(&mut self, _job: &Arc<Job>) -> bool {
        true
    }
}

/// Information of a job.
#[repr(C)]
#[derive(Default, Debug)]
pub struct JobInfo {
    /// The termination code, valid once `exited` is set.
    pub return_code: i64,
    /// Whether the job reached the `Dead` state.
    pub exited: bool,
    /// Whether the job is tagged for killing by the out-of-memory handler.
    pub kill_on_oom: bool,
    /// Whether a debugger exception channel is bound.
    pub debugger_attached: bool,
    padding: [u8; 5],
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn create() {
        let root_job = Job::root();
        let job = root_job.create_child().expect("failed to create job");
        assert_eq!(job.max_height(), root_job.max_height() - 1);
        assert!(Arc::ptr_eq(&job.parent().unwrap(), &root_job));
        assert_eq!(job.related_koid(), root_job.id());
        assert_eq!(root_job.related_koid(), 0);
    }

    #[test]
    fn height_floor() {
        let root_job = Job::root();
        let mut job = root_job.clone();
        for expected in (0..ROOT_JOB_MAX_HEIGHT).rev() {
            job = job.create_child().expect("failed to create job");
            assert_eq!(job.max_height(), expected);
        }
        // the tree cannot deepen below a zero-height job
        assert_eq!(job.create_child().err(), Some(ZxError::OUT_OF_RANGE));
        assert_eq!(job.job_count(), 0);
    }

    #[test]
    fn emptiness_signals() {
        let root_job = Job::root();
        assert!(root_job
            .signal()
            .contains(Signal::JOB_NO_JOBS | Signal::JOB_NO_PROCESSES));

        let job = root_job.create_child().unwrap();
        let proc = Process::create(&root_job, "proc").unwrap();
        assert!(!root_job.signal().contains(Signal::JOB_NO_JOBS));
        assert!(!root_job.signal().contains(Signal::JOB_NO_PROCESSES));

        job.kill(0);
        proc.exit(0);
        assert!(root_job
            .signal()
            .contains(Signal::JOB_NO_JOBS | Signal::JOB_NO_PROCESSES));
    }

    struct CountingVisitor {
        processes: usize,
        jobs: usize,
    }

    impl JobEnumerator for CountingVisitor {
        fn on_process(&mut self, _proc: &Arc<Process>) -> bool {
            self.processes += 1;
            true
        }
        fn on_job(&mut self, _job: &Arc<Job>) -> bool {
            self.jobs += 1;
            true
        }
    }

    #[test]
    fn counts_match_enumeration() {
        let root_job = Job::root();
        let job_a = root_job.create_child().unwrap();
        let _job_b = root_job.create_child().unwrap();
        let _proc_a = Process::create(&root_job, "a").unwrap();
        let proc_b = Process::create(&root_job, "b").unwrap();

        let mut visitor = CountingVisitor {
            processes: 0,
            jobs: 0,
        };
        assert!(root_job.enumerate_children(&mut visitor, false));
        assert_eq!(visitor.jobs, root_job.job_count());
        assert_eq!(visitor.processes, root_job.process_count());
        assert_eq!(visitor.jobs, 2);
        assert_eq!(visitor.processes, 2);

        job_a.kill(0);
        proc_b.exit(0);
        let mut visitor = CountingVisitor {
            processes: 0,
            jobs: 0,
        };
        assert!(root_job.enumerate_children(&mut visitor, false));
        assert_eq!(visitor.jobs, 1);
        assert_eq!(visitor.processes, 1);
    }

    #[test]
    fn enumeration_order() {
        let root_job = Job::root();
        let job_a = root_job.create_child().unwrap();
        let job_b = root_job.create_child().unwrap();
        let job_a1 = job_a.create_child().unwrap();
        let proc = Process::create(&job_a, "proc").unwrap();

        struct Recorder(Vec<KoID>);
        impl JobEnumerator for Recorder {
            fn on_process(&mut self, proc: &Arc<Process>) -> bool {
                self.0.push(proc.id());
                true
            }
            fn on_job(&mut self, job: &Arc<Job>) -> bool {
                self.0.push(job.id());
                true
            }
        }

        let mut recorder = Recorder(Vec::new());
        assert!(root_job.enumerate_children(&mut recorder, true));
        // own processes come first; each child job is then visited and
        // descended into before its next sibling
        assert_eq!(
            recorder.0,
            vec![job_a.id(), proc.id(), job_a1.id(), job_b.id()]
        );

        struct StopAt(KoID);
        impl JobEnumerator for StopAt {
            fn on_job(&mut self, job: &Arc<Job>) -> bool {
                job.id() != self.0
            }
        }
        assert!(!root_job.enumerate_children(&mut StopAt(job_b.id()), true));
    }

    #[test]
    fn emptiness_signal_survives_churn() {
        let root_job = Job::root();
        let threads: Vec<_> = (0..2)
            .map(|_| {
                let job = root_job.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        let proc = Process::create(&job, "proc").unwrap();
                        proc.exit(0);
                    }
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }
        // an add racing a remove must not strand the signal deasserted
        assert_eq!(root_job.process_count(), 0);
        assert!(root_job.signal().contains(Signal::JOB_NO_PROCESSES));
    }

    #[test]
    fn no_add_after_kill() {
        let root_job = Job::root();
        assert!(root_job.kill(0));
        assert_eq!(root_job.create_child().err(), Some(ZxError::BAD_STATE));
        assert_eq!(
            Process::create(&root_job, "proc").err(),
            Some(ZxError::BAD_STATE)
        );
        assert_eq!(root_job.job_count(), 0);
        assert_eq!(root_job.process_count(), 0);
    }

    #[test]
    fn kill_is_idempotent() {
        let root_job = Job::root();
        let job = root_job.create_child().unwrap();
        assert!(job.kill(7));
        assert!(!job.kill(9));
        let info = job.get_info();
        assert!(info.exited);
        assert_eq!(info.return_code, 7);
    }

    #[test]
    fn depth_first_death_order() {
        let root_job = Job::root();
        let job_a = root_job.create_child().unwrap();
        let job_b = job_a.create_child().unwrap();

        let order = Arc::new(Mutex::new(Vec::new()));
        for job in [&root_job, &job_a, &job_b] {
            let order = order.clone();
            let id = job.id();
            job.add_signal_callback(Box::new(move |signal| {
                if !signal.contains(Signal::JOB_TERMINATED) {
                    return false;
                }
                order.lock().push(id);
                true
            }));
        }

        assert!(root_job.kill(0));
        assert_eq!(*order.lock(), vec![job_b.id(), job_a.id(), root_job.id()]);
    }

    #[test]
    fn end_to_end_kill() {
        let root_job = Job::root();
        let job_a = root_job.create_child().unwrap();
        let job_b = job_a.create_child().unwrap();
        let proc = Process::create(&job_b, "proc").unwrap();
        assert_eq!(job_b.max_height(), ROOT_JOB_MAX_HEIGHT - 2);

        assert!(root_job.kill(7));
        assert_eq!(proc.exit_code(), Some(7));
        for job in [&job_b, &job_a, &root_job] {
            let info = job.get_info();
            assert!(info.exited);
            assert_eq!(info.return_code, 7);
            assert!(job.signal().contains(Signal::JOB_TERMINATED));
        }
        // the dead jobs unlinked themselves
        assert_eq!(root_job.job_count(), 0);
        assert_eq!(job_a.job_count(), 0);
    }

    #[test]
    fn policy_gated_by_children() {
        let root_job = Job::root();

        // default policy
        assert_eq!(
            root_job.policy().get_action(PolicyCondition::BadHandle),
            None
        );

        // set policy for root job
        let policy = &[BasicPolicy {
            condition: PolicyCondition::BadHandle,
            action: PolicyAction::Deny,
        }];
        root_job
            .set_policy_basic(SetPolicyOptions::Relative, policy)
            .expect("failed to set policy");
        assert_eq!(
            root_job.policy().get_action(PolicyCondition::BadHandle),
            Some(PolicyAction::Deny)
        );

        // override policy should success
        let policy = &[BasicPolicy {
            condition: PolicyCondition::BadHandle,
            action: PolicyAction::Allow,
        }];
        root_job
            .set_policy_basic(SetPolicyOptions::Relative, policy)
            .expect("failed to set policy");
        assert_eq!(
            root_job.policy().get_action(PolicyCondition::BadHandle),
            Some(PolicyAction::Allow)
        );

        // create a child job
        let job = root_job.create_child().expect("failed to create job");

        // should inherit parent's policy.
        assert_eq!(
            job.policy().get_action(PolicyCondition::BadHandle),
            Some(PolicyAction::Allow)
        );

        // setting policy for a non-empty job should fail.
        assert_eq!(
            root_job.set_policy_basic(SetPolicyOptions::Relative, &[]),
            Err(ZxError::BAD_STATE)
        );

        // set new policy should success.
        let policy = &[BasicPolicy {
            condition: PolicyCondition::WrongObject,
            action: PolicyAction::Allow,
        }];
        job.set_policy_basic(SetPolicyOptions::Relative, policy)
            .expect("failed to set policy");
        assert_eq!(
            job.policy().get_action(PolicyCondition::WrongObject),
            Some(PolicyAction::Allow)
        );

        // relatively setting existing policy should be ignored.
        let policy = &[BasicPolicy {
            condition: PolicyCondition::BadHandle,
            action: PolicyAction::Deny,
        }];
        job.set_policy_basic(SetPolicyOptions::Relative, policy)
            .expect("failed to set policy");
        assert_eq!(
            job.policy().get_action(PolicyCondition::BadHandle),
            Some(PolicyAction::Allow)
        );

        // absolutely setting existing policy should fail.
        assert_eq!(
            job.set_policy_basic(SetPolicyOptions::Absolute, policy),
            Err(ZxError::ALREADY_EXISTS)
        );

        // once the children are gone the policy opens up again
        job.kill(0);
        root_job
            .set_policy_basic(SetPolicyOptions::Relative, policy)
            .expect("failed to set policy");
    }

    #[test]
    fn policy_v2_override() {
        let root_job = Job::root();
        root_job
            .set_policy_basic_v2(
                SetPolicyOptions::Relative,
                &[BasicPolicyV2 {
                    condition: PolicyCondition::NewChannel,
                    action: PolicyAction::Deny,
                    override_mode: PolicyOverride::Allow,
                }],
            )
            .unwrap();

        // an overridable parent rule can be replaced by the child
        let job = root_job.create_child().unwrap();
        job.set_policy_basic(
            SetPolicyOptions::Absolute,
            &[BasicPolicy {
                condition: PolicyCondition::NewChannel,
                action: PolicyAction::Allow,
            }],
        )
        .unwrap();
        assert_eq!(
            job.policy().get_action(PolicyCondition::NewChannel),
            Some(PolicyAction::Allow)
        );

        // but the grandchild now hits the child's non-overridable rule
        let grandchild = job.create_child().unwrap();
        assert_eq!(
            grandchild.set_policy_basic_v2(
                SetPolicyOptions::Absolute,
                &[BasicPolicyV2 {
                    condition: PolicyCondition::NewChannel,
                    action: PolicyAction::Deny,
                    override_mode: PolicyOverride::Allow,
                }],
            ),
            Err(ZxError::ALREADY_EXISTS)
        );
    }

    #[test]
    fn timer_slack_policy() {
        let root_job = Job::root();
        root_job
            .set_policy_timer_slack(TimerSlackPolicy {
                min_slack: 200,
                default_mode: Slack::Late,
            })
            .unwrap();
        assert_eq!(root_job.timer_slack().amount(), 200);
        assert_eq!(root_job.timer_slack().mode(), Slack::Late);

        assert_eq!(
            root_job.set_policy_timer_slack(TimerSlackPolicy {
                min_slack: -1,
                default_mode: Slack::Center,
            }),
            Err(ZxError::INVALID_ARGS)
        );

        let _job = root_job.create_child().unwrap();
        assert_eq!(
            root_job.set_policy_timer_slack(TimerSlackPolicy {
                min_slack: 300,
                default_mode: Slack::Center,
            }),
            Err(ZxError::BAD_STATE)
        );
    }

    #[test]
    fn critical_process() {
        let root_job = Job::root();
        let job = root_job.create_child().unwrap();
        let proc = Process::create(&job, "critical").unwrap();
        let outsider = Process::create(&root_job, "outsider").unwrap();

        assert_eq!(
            job.set_critical(&outsider, false).err(),
            Some(ZxError::INVALID_ARGS)
        );
        job.set_critical(&proc, true).unwrap();
        assert_eq!(
            job.set_critical(&proc, false).err(),
            Some(ZxError::ALREADY_BOUND)
        );

        // a clean exit does not trip a nonzero-filtered critical process
        proc.exit(0);
        assert!(!job.get_info().exited);

        let job2 = root_job.create_child().unwrap();
        let proc2 = Process::create(&job2, "critical").unwrap();
        job2.set_critical(&proc2, false).unwrap();
        proc2.exit(0);
        let info = job2.get_info();
        assert!(info.exited);
        assert_eq!(info.return_code, TASK_RETCODE_CRITICAL_PROCESS_KILL);
    }

    #[test]
    fn oom_prefers_deepest_candidate() {
        let root_job = Job::root();
        let job_1 = root_job.create_child().unwrap();
        let job_2 = job_1.create_child().unwrap();
        let job_3 = job_2.create_child().unwrap();
        let job_4 = job_3.create_child().unwrap();

        // nothing is tagged yet
        assert!(!root_job.kill_job_with_kill_on_oom());

        job_2.set_kill_on_oom(true);
        job_3.set_kill_on_oom(true);
        job_4.set_kill_on_oom(true);
        assert!(job_2.get_info().kill_on_oom);

        assert!(root_job.kill_job_with_kill_on_oom());
        let info = job_2.get_info();
        assert!(info.exited);
        assert_eq!(info.return_code, TASK_RETCODE_OOM_KILL);
        // the whole candidate subtree went with it
        assert!(job_4.get_info().exited);

        // every remaining candidate is gone now
        assert!(!root_job.kill_job_with_kill_on_oom());
    }

    #[test]
    fn depleted_callback_fires_once() {
        let root_job = Job::root();
        let fired = Arc::new(core::sync::atomic::AtomicUsize::new(0));
        root_job.set_depleted_callback({
            let fired = fired.clone();
            move || {
                fired.fetch_add(1, core::sync::atomic::Ordering::SeqCst);
            }
        });

        let job = root_job.create_child().unwrap();
        let proc = Process::create(&root_job, "proc").unwrap();

        job.kill(0);
        assert_eq!(fired.load(core::sync::atomic::Ordering::SeqCst), 0);
        proc.exit(0);
        assert_eq!(fired.load(core::sync::atomic::Ordering::SeqCst), 1);

        // the callback is consumed; a second depletion does not re-fire
        let job = root_job.create_child().unwrap();
        job.kill(0);
        assert_eq!(fired.load(core::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn lookup_and_get_child() {
        let root_job = Job::root();
        let job = root_job.create_child().expect("failed to create job");
        let proc = Process::create(&root_job, "proc").expect("failed to create process");

        assert!(Arc::ptr_eq(
            &root_job.lookup_job_by_id(job.id()).unwrap(),
            &job
        ));
        assert!(Arc::ptr_eq(
            &root_job.lookup_process_by_id(proc.id()).unwrap(),
            &proc
        ));
        // lookups are not recursive and absence is not an error
        let grandchild = job.create_child().unwrap();
        assert!(root_job.lookup_job_by_id(grandchild.id()).is_none());
        assert!(root_job.lookup_process_by_id(job.id()).is_none());

        let root_job: Arc<dyn KernelObject> = root_job;
        assert_eq!(root_job.get_child(job.id()).unwrap().id(), job.id());
        assert_eq!(root_job.get_child(proc.id()).unwrap().id(), proc.id());
        assert_eq!(
            root_job.get_child(root_job.id()).err(),
            Some(ZxError::NOT_FOUND)
        );
    }

    #[test]
    fn debugger_attached() {
        let root_job = Job::root();
        assert!(!root_job.get_info().debugger_attached);

        let channel = root_job.debug_exceptionate().create_channel().unwrap();
        assert!(root_job.get_info().debugger_attached);

        // death shuts the exception channels down
        root_job.kill(0);
        assert!(!root_job.get_info().debugger_attached);
        assert_eq!(
            root_job.debug_exceptionate().create_channel().err(),
            Some(ZxError::BAD_STATE)
        );
        assert_eq!(
            root_job.exceptionate().create_channel().err(),
            Some(ZxError::BAD_STATE)
        );
        drop(channel);
    }

    #[test]
    fn task_trait_kill() {
        let root_job = Job::root();
        let job = root_job.create_child().unwrap();
        let proc = Process::create(&root_job, "proc").unwrap();

        Task::kill(&*job);
        Task::kill(&*proc);
        assert_eq!(job.get_info().return_code, TASK_RETCODE_SYSCALL_KILL);
        assert_eq!(proc.exit_code(), Some(TASK_RETCODE_SYSCALL_KILL));
    }
}
