use {
    crate::error::*,
    crate::object::*,
    alloc::sync::{Arc, Weak},
    spin::Mutex,
};

/// Kernel-owned exception channel endpoint.
///
/// Tasks own one `Exceptionate` per channel type. Exception delivery itself
/// lives with the thread subsystem; a job only binds, inspects and shuts
/// down its endpoints, which is all that is modeled here.
pub struct Exceptionate {
    type_: ExceptionChannelType,
    inner: Mutex<ExceptionateInner>,
}

struct ExceptionateInner {
    /// Liveness of the user endpoint. Dropping the endpoint unbinds it.
    channel: Option<Weak<ExceptionChannel>>,
    shutdowned: bool,
}

impl Exceptionate {
    /// Create an `Exceptionate`.
    pub fn new(type_: ExceptionChannelType) -> Arc<Self> {
        Arc::new(Exceptionate {
            type_,
            inner: Mutex::new(ExceptionateInner {
                channel: None,
                shutdowned: false,
            }),
        })
    }

    /// Type of the exception channel.
    pub fn channel_type(&self) -> ExceptionChannelType {
        self.type_
    }

    /// Shutdown the exceptionate. Any bound channel is detached and further
    /// binds fail with `BAD_STATE`.
    pub fn shutdown(&self) {
        let mut inner = self.inner.lock();
        inner.channel.take();
        inner.shutdowned = true;
    }

    /// Create an exception channel endpoint for user.
    pub fn create_channel(&self) -> ZxResult<Arc<ExceptionChannel>> {
        let mut inner = self.inner.lock();
        if inner.shutdowned {
            return Err(ZxError::BAD_STATE);
        }
        if let Some(channel) = inner.channel.as_ref() {
            if channel.upgrade().is_some() {
                // already has a valid channel
                return Err(ZxError::ALREADY_BOUND);
            }
        }
        let channel = Arc::new(ExceptionChannel {
            base: KObjectBase::new(),
            type_: self.type_,
        });
        inner.channel.replace(Arc::downgrade(&channel));
        Ok(channel)
    }

    /// Whether a live channel is bound.
    pub fn has_channel(&self) -> bool {
        let mut inner = self.inner.lock();
        match inner.channel.as_ref() {
            Some(channel) if channel.upgrade().is_some() => true,
            Some(_) => {
                inner.channel.take();
                false
            }
            None => false,
        }
    }
}

/// User-owned endpoint of an exception channel.
pub struct ExceptionChannel {
    base: KObjectBase,
    type_: ExceptionChannelType,
}

impl_kobject!(ExceptionChannel);

impl ExceptionChannel {
    /// Type of the exception channel.
    pub fn channel_type(&self) -> ExceptionChannelType {
        self.type_
    }
}

/// Type of the exception channel
#[allow(missing_docs)]
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ExceptionChannelType {
    None = 0,
    Debugger = 1,
    Thread = 2,
    Process = 3,
    Job = 4,
    JobDebugger = 5,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_and_rebind() {
        let exceptionate = Exceptionate::new(ExceptionChannelType::Job);
        assert!(!exceptionate.has_channel());

        let channel = exceptionate.create_channel().unwrap();
        assert_eq!(channel.channel_type(), ExceptionChannelType::Job);
        assert!(exceptionate.has_channel());

        // binding twice while the endpoint is alive fails
        assert_eq!(exceptionate.create_channel().err(), Some(ZxError::ALREADY_BOUND));

        // dropping the endpoint unbinds it
        drop(channel);
        assert!(!exceptionate.has_channel());
        let _channel = exceptionate.create_channel().unwrap();
    }

    #[test]
    fn shutdown() {
        let exceptionate = Exceptionate::new(ExceptionChannelType::JobDebugger);
        let channel = exceptionate.create_channel().unwrap();

        exceptionate.shutdown();
        assert!(!exceptionate.has_channel());
        assert_eq!(exceptionate.create_channel().err(), Some(ZxError::BAD_STATE));
        // shutdown is idempotent
        exceptionate.shutdown();

        drop(channel);
        assert_eq!(
            exceptionate.channel_type(),
            ExceptionChannelType::JobDebugger
        );
    }
}
