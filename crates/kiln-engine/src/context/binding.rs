use std::fmt;
use std::rc::Rc;

use crate::driver::Driver;
use crate::uuid::Uuid;

/// A context id plus the driver it lives on.
///
/// Held by everything that must make its context current before touching the driver.
#[derive(Clone)]
pub struct ContextBinding {
    context: Uuid,
    driver: Rc<dyn Driver>,
}

impl ContextBinding {
    pub(crate) fn new(context: Uuid, driver: Rc<dyn Driver>) -> Self {
        Self { context, driver }
    }

    pub fn context(&self) -> Uuid {
        self.context
    }

    pub fn driver(&self) -> &Rc<dyn Driver> {
        &self.driver
    }

    pub fn bind(&self) {
        self.driver.make_current(self.context);
    }

    pub fn is_current(&self) -> bool {
        self.driver.current() == Some(self.context)
    }
}

impl fmt::Debug for ContextBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextBinding")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
