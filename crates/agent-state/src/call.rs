use std::{fmt, sync::Arc};

use opentelemetry::KeyValue;

use crate::slots::SlotNotifier;

/// Identity of the function a container serves. Tags all container
/// telemetry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallIdentity {
    pub app_id: String,
    pub fn_id: String,
    pub image: String,
}

impl CallIdentity {
    pub fn new(
        app_id: impl Into<String>,
        fn_id: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            fn_id: fn_id.into(),
            image: image.into(),
        }
    }

    pub fn attributes(&self) -> [KeyValue; 3] {
        [
            KeyValue::new("app_id", self.app_id.clone()),
            KeyValue::new("fn_id", self.fn_id.clone()),
            KeyValue::new("image_name", self.image.clone()),
        ]
    }
}

impl fmt::Display for CallIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.app_id, self.fn_id, self.image)
    }
}

/// A call as seen by the container tracker: who it belongs to, and the slot
/// queue (if any) that wants to hear about container state changes.
#[derive(Clone)]
pub struct Call {
    pub identity: CallIdentity,
    pub slots: Option<Arc<dyn SlotNotifier>>,
}

impl Call {
    pub fn new(identity: CallIdentity) -> Self {
        Self {
            identity,
            slots: None,
        }
    }

    pub fn with_slots(mut self, slots: Arc<dyn SlotNotifier>) -> Self {
        self.slots = Some(slots);
        self
    }

    pub fn slots(&self) -> Option<&dyn SlotNotifier> {
        self.slots.as_deref()
    }
}

impl fmt::Debug for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Call")
            .field("identity", &self.identity)
            .field("slots", &self.slots.is_some())
            .finish()
    }
}
