use std::ops::Deref;
use std::sync::{Arc, Weak};

use crate::context::Context;
use crate::error::MenuError;
use crate::menu::base::{validate_size, MenuCore};
use crate::menu::{Menu, MenuEnv};
use crate::types::UserId;

/// A single-page menu with no behaviour beyond [`MenuCore`].
pub struct SimpleMenu {
    core: MenuCore,
}

impl SimpleMenu {
    pub fn new(
        title: &str,
        size: usize,
        user: UserId,
        context: Context,
        env: MenuEnv,
    ) -> Result<Arc<Self>, MenuError> {
        validate_size(size)?;
        Ok(Arc::new_cyclic(|this: &Weak<SimpleMenu>| {
            let this: Weak<dyn Menu> = this.clone();
            SimpleMenu {
                core: MenuCore::new(title, size, user, context, env, this),
            }
        }))
    }
}

impl Menu for SimpleMenu {
    fn core(&self) -> &MenuCore {
        &self.core
    }
}

impl Deref for SimpleMenu {
    type Target = MenuCore;

    fn deref(&self) -> &MenuCore {
        &self.core
    }
}
