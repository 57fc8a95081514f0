use {crate::error::*, numeric_enum_macro::numeric_enum};

/// Security and resource policies of a job.
#[derive(Default, Copy, Clone)]
pub struct JobPolicy {
    entries: [Option<PolicyEntry>; 15],
}

/// One applied rule: the action taken on a condition, plus whether
/// descendant jobs may replace it.
#[derive(Debug, Copy, Clone)]
struct PolicyEntry {
    action: PolicyAction,
    override_mode: PolicyOverride,
}

impl JobPolicy {
    /// Get the action of a policy `condition`.
    pub fn get_action(&self, condition: PolicyCondition) -> Option<PolicyAction> {
        self.entries[condition as usize].map(|e| e.action)
    }

    /// Get the override mode of a policy `condition`, if one is set.
    pub fn get_override(&self, condition: PolicyCondition) -> Option<PolicyOverride> {
        self.entries[condition as usize].map(|e| e.override_mode)
    }

    /// Apply a basic policy. V1 rules can never be overridden by descendants.
    pub fn apply(&mut self, policy: BasicPolicy) {
        self.entries[policy.condition as usize] = Some(PolicyEntry {
            action: policy.action,
            override_mode: PolicyOverride::Deny,
        });
    }

    /// Apply a basic policy carrying its own override mode.
    pub fn apply_v2(&mut self, policy: BasicPolicyV2) {
        self.entries[policy.condition as usize] = Some(PolicyEntry {
            action: policy.action,
            override_mode: policy.override_mode,
        });
    }

    /// Merge the policy with `parent`'s.
    ///
    /// An entry of this policy only ever coexists with a parent entry for the
    /// same condition when the parent allowed the override, so the own entry
    /// wins where present.
    pub fn merge(&self, parent: &Self) -> Self {
        let mut new = *self;
        for i in 0..new.entries.len() {
            if new.entries[i].is_none() {
                new.entries[i] = parent.entries[i];
            }
        }
        new
    }
}

/// Control the effect in the case of conflict between
/// the existing policies and the new policies when setting new policies.
#[derive(Debug, Copy, Clone)]
pub enum SetPolicyOptions {
    /// Policy is applied for all conditions in policy or the call fails.
    Absolute,
    /// Policy is applied for the conditions not specifically overridden by the parent policy.
    Relative,
}

/// The policy type, v1 format.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct BasicPolicy {
    /// Condition when the policy is applied.
    pub condition: PolicyCondition,
    /// Action taken when the condition happens.
    pub action: PolicyAction,
}

/// The policy type, v2 format: a v1 rule plus a per-rule override mode.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct BasicPolicyV2 {
    /// Condition when the policy is applied.
    pub condition: PolicyCondition,
    /// Action taken when the condition happens.
    pub action: PolicyAction,
    /// Whether descendant jobs may replace this rule.
    pub override_mode: PolicyOverride,
}

numeric_enum! {
    #[repr(u32)]
    /// Whether a policy rule set on a job may be replaced by descendant jobs.
    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    pub enum PolicyOverride {
        /// Descendant jobs may set a different action for the condition.
        Allow = 0,
        /// The rule is final for the whole subtree.
        Deny = 1,
    }
}

numeric_enum! {
    #[repr(u32)]
    /// The condition when a policy is applied.
    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    pub enum PolicyCondition {
        /// A process under this job is attempting to issue a syscall with an invalid handle.
        /// In this case, `PolicyAction::Allow` and `PolicyAction::Deny` are equivalent:
        /// if the syscall returns, it will always return the error ZX_ERR_BAD_HANDLE.
        BadHandle = 0,
        /// A process under this job is attempting to issue a syscall with a handle that does not support such operation.
        WrongObject = 1,
        /// A process under this job is attempting to map an address region with write-execute access.
        VmarWx = 2,
        /// A special condition that stands for all of the above ZX_NEW conditions
        /// such as NEW_VMO, NEW_CHANNEL, NEW_EVENT, NEW_EVENTPAIR, NEW_PORT, NEW_SOCKET, NEW_FIFO,
        /// And any future ZX_NEW policy.
        /// This will include any new kernel objects which do not require a parent object for creation.
        NewAny = 3,
        /// A process under this job is attempting to create a new vm object.
        NewVMO = 4,
        /// A process under this job is attempting to create a new channel.
        NewChannel = 5,
        /// A process under this job is attempting to create a new event.
        NewEvent = 6,
        /// A process under this job is attempting to create a new event pair.
        NewEventPair = 7,
        /// A process under this job is attempting to create a new port.
        NewPort = 8,
        /// A process under this job is attempting to create a new socket.
        NewSocket = 9,
        /// A process under this job is attempting to create a new fifo.
        NewFIFO = 10,
        /// A process under this job is attempting to create a new timer.
        NewTimer = 11,
        /// A process under this job is attempting to create a new process.
        NewProcess = 12,
        /// A process under this job is attempting to create a new profile.
        NewProfile = 13,
        /// A process under this job is attempting to use zx_vmo_replace_as_executable()
        /// with a ZX_HANDLE_INVALID as the second argument rather than a valid ZX_RSRC_KIND_VMEX.
        AmbientMarkVMOExec = 14,
    }
}

numeric_enum! {
    #[repr(u32)]
    /// The action taken when the condition happens specified by a policy.
    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    pub enum PolicyAction {
        /// Allow condition.
        Allow = 0,
        /// Prevent condition.
        Deny = 1,
        /// Generate an exception via the debug port. An exception generated this
        /// way acts as a breakpoint. The thread may be resumed after the exception.
        AllowException = 2,
        /// Just like `AllowException`, but after resuming condition is denied.
        DenyException = 3,
        /// Terminate the process.
        Kill = 4,
    }
}

/// Timer slack policy.
///
/// Slack determines how much a timer of a process under the job is allowed
/// to deviate from its deadline.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct TimerSlackPolicy {
    /// The minimum amount of slack, in nanoseconds.
    pub min_slack: i64,
    /// The default mode applied to timers that do not pick one.
    pub default_mode: Slack,
}

/// Check whether the policy is valid.
pub fn check_timer_policy(policy: &TimerSlackPolicy) -> ZxResult {
    if policy.min_slack.is_negative() {
        return Err(ZxError::INVALID_ARGS);
    }
    Ok(())
}

numeric_enum! {
    #[repr(u32)]
    /// Slack specifies how much a timer or event is allowed to deviate from its deadline.
    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    pub enum Slack {
        /// slack is centered around deadline
        Center = 0,
        /// slack interval is (deadline - slack, deadline]
        Early = 1,
        /// slack interval is [deadline, deadline + slack)
        Late = 2,
    }
}

/// The effective timer slack of a job.
#[repr(C)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TimerSlack {
    amount: i64,
    mode: Slack,
}

impl TimerSlack {
    /// The slack amount, in nanoseconds.
    pub fn amount(&self) -> i64 {
        self.amount
    }

    /// The slack mode.
    pub fn mode(&self) -> Slack {
        self.mode
    }

    /// Combine with a requested policy. The amount never decreases.
    pub(super) fn generate_new(&self, policy: TimerSlackPolicy) -> TimerSlack {
        TimerSlack {
            amount: self.amount.max(policy.min_slack),
            mode: policy.default_mode,
        }
    }
}

impl Default for TimerSlack {
    fn default() -> Self {
        TimerSlack {
            amount: 0,
            mode: Slack::Center,
        }
    }
}
